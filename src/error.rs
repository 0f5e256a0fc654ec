use enough::StopReason;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level count must be between 1 and the histogram length {domain}, got {levels}")]
    InvalidLevelCount { levels: usize, domain: usize },

    #[error("histogram must cover at least one value")]
    EmptyHistogram,

    #[error("histogram domain of {0} values exceeds the 16-bit value range")]
    DomainTooLarge(usize),

    #[error("value {value} exceeds the declared maximum {max_value}")]
    ValueOutOfRange { value: u16, max_value: u16 },

    #[error("not enough memory for the partition tables")]
    AllocationFailure,

    #[error("histogram of length {histogram} is shorter than the mapping domain {mapping}")]
    IncompatibleDomain { histogram: usize, mapping: usize },

    #[error("image sizes differ: {expected:?} and {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("invalid mapping: {0}")]
    InvalidMapping(&'static str),

    #[error("computation stopped: {0:?}")]
    Stopped(StopReason),
}

impl From<StopReason> for LevelError {
    fn from(reason: StopReason) -> Self {
        Self::Stopped(reason)
    }
}
