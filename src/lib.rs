//! Optimal gray-level reduction.
//!
//! Given the histogram of a grayscale image and a target level count `k`,
//! find the partition of the value range into `k` contiguous intervals, and
//! one output level per interval, that minimizes the histogram-weighted
//! squared error. The result is a [`Mapping`], which expands into a lookup
//! table for remapping pixels.
//!
//! ```
//! use zenlevels::{Histogram, compute_mapping};
//!
//! let hist = Histogram::from_counts(vec![4, 0, 0, 4]).unwrap();
//! let mapping = compute_mapping(&hist, 2).unwrap();
//! assert_eq!(mapping.cost(), Some(0));
//! assert_eq!(mapping.to_lookup_table(3)[3], 3);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod cost;
pub mod error;
pub mod histogram;
pub mod mapping;
pub mod partition;
#[cfg(feature = "std")]
pub mod pgm;
pub mod remap;
pub mod uniform;

pub use cost::{IntervalCost, IntervalFit};
pub use enough::{Stop, StopReason, Unstoppable};
pub use error::LevelError;
pub use histogram::{Histogram, MAX_DOMAIN};
pub use imgref::{ImgRef, ImgVec};
pub use mapping::{Interval, Mapping};
pub use remap::{LevelResult, apply_mapping, pixel_error, quantize_levels};

/// How the partition is searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Dynamic program over all partitions. Minimum error, `O(L² · k)`.
    #[default]
    ExactDp,
    /// Equal-population bins. Linear time, approximate.
    UniformHeuristic,
}

/// Configuration for level reduction.
#[derive(Debug, Clone)]
pub struct LevelConfig {
    /// Number of output levels (`1..=L`).
    pub levels: usize,
    /// Partition search strategy.
    pub strategy: Strategy,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            levels: 16,
            strategy: Strategy::ExactDp,
        }
    }
}

impl LevelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn levels(mut self, n: usize) -> Self {
        self.levels = n;
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Minimum-error mapping of `histogram` onto `levels` levels.
pub fn compute_mapping(histogram: &Histogram, levels: usize) -> Result<Mapping, LevelError> {
    compute_mapping_with(histogram, &LevelConfig::new().levels(levels))
}

/// Mapping of `histogram` using the strategy chosen in `config`.
pub fn compute_mapping_with(
    histogram: &Histogram,
    config: &LevelConfig,
) -> Result<Mapping, LevelError> {
    compute_mapping_with_stop(histogram, config, &Unstoppable)
}

/// Like [`compute_mapping_with`], polling `stop` while the exact search runs.
pub fn compute_mapping_with_stop(
    histogram: &Histogram,
    config: &LevelConfig,
    stop: &dyn Stop,
) -> Result<Mapping, LevelError> {
    validate_inputs(histogram, config)?;

    match config.strategy {
        Strategy::ExactDp => partition::optimal_partition(histogram, config.levels, stop),
        Strategy::UniformHeuristic => {
            stop.check()?;
            uniform::uniform_partition(histogram, config.levels)
        }
    }
}

fn validate_inputs(histogram: &Histogram, config: &LevelConfig) -> Result<(), LevelError> {
    if config.levels == 0 || config.levels > histogram.len() {
        return Err(LevelError::InvalidLevelCount {
            levels: config.levels,
            domain: histogram.len(),
        });
    }
    Ok(())
}
