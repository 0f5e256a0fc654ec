//! Exact minimum-error partition of a histogram into `k` intervals.
//!
//! `dp[i][j]` is the least error of covering `[0, j]` with `i + 1` intervals:
//!
//! ```text
//! dp[0][j] = E(0, j)
//! dp[i][j] = min_{m in [i-1, j-1]} dp[i-1][m] + E(m+1, j)
//! ```
//!
//! where `E(a, b)` is the [`IntervalCost`] error. Both tables are flat,
//! row-major `k × L`; `split[i][j]` keeps the smallest minimizing `m`.
//! Row `i` only reads row `i - 1`, so a row may be filled in parallel.

extern crate alloc;
use alloc::vec::Vec;

use enough::Stop;
use log::{debug, trace};

use crate::Strategy;
use crate::cost::{IntervalCost, try_table};
use crate::error::LevelError;
use crate::histogram::Histogram;
use crate::mapping::Mapping;

/// Compute the minimum squared-error mapping of `histogram` onto `levels` levels.
///
/// `stop` is polled once per table row.
pub fn optimal_partition(
    histogram: &Histogram,
    levels: usize,
    stop: &dyn Stop,
) -> Result<Mapping, LevelError> {
    let len = histogram.len();
    if levels == 0 || levels > len {
        return Err(LevelError::InvalidLevelCount {
            levels,
            domain: len,
        });
    }
    debug!("exact partition: {len} values into {levels} levels");

    let cost = IntervalCost::new(histogram)?;
    let k = levels;
    let cells = k.checked_mul(len).ok_or(LevelError::AllocationFailure)?;
    let mut dp = try_table(cells, u128::MAX)?;
    let mut split = try_table(cells, 0u16)?;

    // Interval i can end no earlier than i and no later than len - k + i,
    // leaving one value for each later interval. The last row only needs len - 1.
    for i in 0..k {
        stop.check()?;
        let hi = len - k + i;
        let lo = if i + 1 == k { len - 1 } else { i };

        if i == 0 {
            for j in lo..=hi {
                dp[j] = cost.error(0, j);
            }
            continue;
        }

        let (done, rest) = dp.split_at_mut(i * len);
        let prev = &done[(i - 1) * len..];
        let row = &mut rest[..len];
        let split_row = &mut split[i * len..(i + 1) * len];
        fill_row(
            prev,
            &mut row[lo..=hi],
            &mut split_row[lo..=hi],
            &cost,
            i,
            lo,
        );
        trace!("row {i}: filled values {lo}..={hi}");
    }

    let total = dp[(k - 1) * len + len - 1];

    let mut thresholds = alloc::vec![0u16; k];
    let mut end = len - 1;
    for i in (1..k).rev() {
        thresholds[i] = end as u16;
        end = split[i * len + end] as usize;
    }
    thresholds[0] = end as u16;

    let mut start = 0usize;
    let mut representatives = Vec::with_capacity(k);
    for &t in &thresholds {
        let fit = cost.fit(start, t as usize);
        representatives.push(fit.representative);
        start = t as usize + 1;
    }

    debug!("exact partition: error {total}");
    Ok(Mapping::from_solution(
        thresholds,
        representatives,
        total,
        Strategy::ExactDp,
    ))
}

/// Best split for cell `(i, j)`: the error and the end `m` of interval `i - 1`.
#[inline]
fn best_split(prev: &[u128], cost: &IntervalCost, i: usize, j: usize) -> (u128, u16) {
    let mut best = u128::MAX;
    let mut best_m = i - 1;
    for m in (i - 1)..j {
        let head = prev[m];
        if head == u128::MAX {
            continue;
        }
        let candidate = head + cost.error(m + 1, j);
        if candidate < best {
            best = candidate;
            best_m = m;
        }
    }
    (best, best_m as u16)
}

#[cfg(not(feature = "rayon"))]
fn fill_row(
    prev: &[u128],
    row: &mut [u128],
    split_row: &mut [u16],
    cost: &IntervalCost,
    i: usize,
    lo: usize,
) {
    for (offset, (cell, arg)) in row.iter_mut().zip(split_row.iter_mut()).enumerate() {
        let (value, m) = best_split(prev, cost, i, lo + offset);
        *cell = value;
        *arg = m;
    }
}

#[cfg(feature = "rayon")]
fn fill_row(
    prev: &[u128],
    row: &mut [u128],
    split_row: &mut [u16],
    cost: &IntervalCost,
    i: usize,
    lo: usize,
) {
    use rayon::prelude::*;

    row.par_iter_mut()
        .zip(split_row.par_iter_mut())
        .enumerate()
        .for_each(|(offset, (cell, arg))| {
            let (value, m) = best_split(prev, cost, i, lo + offset);
            *cell = value;
            *arg = m;
        });
}
