extern crate alloc;
use alloc::vec::Vec;

use log::debug;

use crate::Strategy;
use crate::cost::IntervalCost;
use crate::error::LevelError;
use crate::histogram::Histogram;
use crate::mapping::Mapping;

/// Equal-population partition: each interval holds about `total / levels` samples.
///
/// Linear time. Interval `i` closes at the first value where the running
/// count reaches `(i + 1) · total / levels`, clamped so every interval keeps
/// at least one value. Levels are the per-interval optimum, so the result is
/// never better than [`optimal_partition`](crate::partition::optimal_partition).
pub fn uniform_partition(histogram: &Histogram, levels: usize) -> Result<Mapping, LevelError> {
    let len = histogram.len();
    if levels == 0 || levels > len {
        return Err(LevelError::InvalidLevelCount {
            levels,
            domain: len,
        });
    }

    let cost = IntervalCost::new(histogram)?;
    let total = cost.weight(0, len - 1);
    let k = levels;

    let mut thresholds = Vec::with_capacity(k);
    let mut start = 0usize;
    for i in 0..k - 1 {
        let target = total * (i as u128 + 1) / k as u128;
        let latest = len - k + i;
        let mut end = start;
        while end < latest && cost.weight(0, end) < target {
            end += 1;
        }
        thresholds.push(end as u16);
        start = end + 1;
    }
    thresholds.push((len - 1) as u16);

    let mut start = 0usize;
    let mut representatives = Vec::with_capacity(k);
    let mut error = 0u128;
    for &t in &thresholds {
        let fit = cost.fit(start, t as usize);
        representatives.push(fit.representative);
        error += fit.error;
        start = t as usize + 1;
    }

    debug!("uniform partition: {len} values into {k} levels, error {error}");
    Ok(Mapping::from_solution(
        thresholds,
        representatives,
        error,
        Strategy::UniformHeuristic,
    ))
}
