extern crate alloc;
use alloc::vec::Vec;

use crate::Strategy;
use crate::error::LevelError;
use crate::histogram::Histogram;

/// One interval of a [`Mapping`]: every value in `start..=end` becomes `level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: u16,
    pub end: u16,
    pub level: u16,
}

/// A partition of `[0, L)` into `k` contiguous intervals, each with one output level.
///
/// `thresholds()[i]` is the last value of interval `i`; the thresholds are
/// strictly increasing and the last one is `L - 1`, so the intervals cover
/// the domain without gaps or overlaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    thresholds: Vec<u16>,
    levels: Vec<u16>,
    cost: Option<u128>,
    strategy: Option<Strategy>,
}

impl Mapping {
    /// Build a mapping from explicit thresholds and levels.
    ///
    /// The domain is taken to be `[0, thresholds.last()]`.
    pub fn new(thresholds: Vec<u16>, levels: Vec<u16>) -> Result<Self, LevelError> {
        if thresholds.is_empty() {
            return Err(LevelError::InvalidMapping("no intervals"));
        }
        if thresholds.len() != levels.len() {
            return Err(LevelError::InvalidMapping(
                "thresholds and levels differ in length",
            ));
        }
        if thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(LevelError::InvalidMapping(
                "thresholds are not strictly increasing",
            ));
        }
        let last = thresholds[thresholds.len() - 1];
        if levels.iter().any(|&l| l > last) {
            return Err(LevelError::InvalidMapping("level outside the domain"));
        }
        Ok(Self {
            thresholds,
            levels,
            cost: None,
            strategy: None,
        })
    }

    /// Mapping produced by one of the solvers, invariants already upheld.
    pub(crate) fn from_solution(
        thresholds: Vec<u16>,
        levels: Vec<u16>,
        cost: u128,
        strategy: Strategy,
    ) -> Self {
        debug_assert_eq!(thresholds.len(), levels.len());
        debug_assert!(thresholds.windows(2).all(|w| w[0] < w[1]));
        Self {
            thresholds,
            levels,
            cost: Some(cost),
            strategy: Some(strategy),
        }
    }

    /// Number of output levels `k`.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Size of the domain the mapping partitions.
    pub fn domain_len(&self) -> usize {
        self.thresholds[self.thresholds.len() - 1] as usize + 1
    }

    pub fn thresholds(&self) -> &[u16] {
        &self.thresholds
    }

    pub fn levels(&self) -> &[u16] {
        &self.levels
    }

    /// Squared error on the histogram the mapping was computed from.
    /// `None` for mappings built with [`Mapping::new`].
    pub fn cost(&self) -> Option<u128> {
        self.cost
    }

    /// Which solver produced this mapping, if any.
    pub fn strategy(&self) -> Option<Strategy> {
        self.strategy
    }

    /// The `i`-th interval.
    pub fn interval(&self, i: usize) -> Interval {
        let start = if i == 0 { 0 } else { self.thresholds[i - 1] + 1 };
        Interval {
            start,
            end: self.thresholds[i],
            level: self.levels[i],
        }
    }

    pub fn intervals(&self) -> impl Iterator<Item = Interval> + '_ {
        (0..self.level_count()).map(|i| self.interval(i))
    }

    /// Output level for a single value. Values past the domain take the last level.
    pub fn level_for(&self, value: u16) -> u16 {
        let idx = self
            .thresholds
            .partition_point(|&t| t < value)
            .min(self.levels.len() - 1);
        self.levels[idx]
    }

    /// Dense table of `max_value + 1` entries mapping each value to its level.
    ///
    /// `max_value` may be smaller than the domain (the table is cut short) or
    /// larger (the extra values take the last level).
    pub fn to_lookup_table(&self, max_value: u16) -> Vec<u16> {
        let len = max_value as usize + 1;
        let last = self.levels.len() - 1;
        let mut table = Vec::with_capacity(len);
        let mut interval = 0;
        for v in 0..len {
            while interval < last && (self.thresholds[interval] as usize) < v {
                interval += 1;
            }
            table.push(self.levels[interval]);
        }
        table
    }

    /// `Σ counts[v] · (v − lookup[v])²` of this mapping applied to `histogram`.
    ///
    /// The histogram must cover at least the mapping's domain.
    pub fn compute_error(&self, histogram: &Histogram) -> Result<u128, LevelError> {
        if histogram.len() < self.domain_len() {
            return Err(LevelError::IncompatibleDomain {
                histogram: histogram.len(),
                mapping: self.domain_len(),
            });
        }
        let table = self.to_lookup_table(histogram.max_value());
        let error = histogram
            .counts()
            .iter()
            .zip(table.iter())
            .enumerate()
            .map(|(v, (&c, &level))| {
                let d = v.abs_diff(level as usize) as u128;
                c as u128 * d * d
            })
            .sum();
        Ok(error)
    }
}
