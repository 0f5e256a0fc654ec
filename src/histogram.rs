extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::LevelError;

/// Largest supported domain: every 16-bit gray value.
pub const MAX_DOMAIN: usize = 1 << 16;

/// Frequency table over the value domain `[0, len)`.
///
/// `counts()[v]` is the number of occurrences of value `v`. The table never
/// changes after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: Vec<u64>,
}

impl Histogram {
    /// Wrap an existing count table.
    pub fn from_counts(counts: Vec<u64>) -> Result<Self, LevelError> {
        if counts.is_empty() {
            return Err(LevelError::EmptyHistogram);
        }
        if counts.len() > MAX_DOMAIN {
            return Err(LevelError::DomainTooLarge(counts.len()));
        }
        Ok(Self { counts })
    }

    /// Count every pixel of `pixels` over the domain `[0, max_value]`.
    pub fn from_pixels(pixels: &[u16], max_value: u16) -> Result<Self, LevelError> {
        let mut counts = vec![0u64; max_value as usize + 1];
        for &p in pixels {
            let slot = counts
                .get_mut(p as usize)
                .ok_or(LevelError::ValueOutOfRange {
                    value: p,
                    max_value,
                })?;
            *slot += 1;
        }
        Ok(Self { counts })
    }

    /// Build from an iterator of pixel rows, as produced by `ImgRef::rows()`.
    pub fn from_rows<'a>(
        rows: impl Iterator<Item = &'a [u16]>,
        max_value: u16,
    ) -> Result<Self, LevelError> {
        let mut counts = vec![0u64; max_value as usize + 1];
        for row in rows {
            for &p in row {
                let slot = counts
                    .get_mut(p as usize)
                    .ok_or(LevelError::ValueOutOfRange {
                        value: p,
                        max_value,
                    })?;
                *slot += 1;
            }
        }
        Ok(Self { counts })
    }

    /// Domain size `L`.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Largest value of the domain, `L - 1`.
    pub fn max_value(&self) -> u16 {
        // len is in 1..=MAX_DOMAIN
        (self.counts.len() - 1) as u16
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Total number of counted samples.
    pub fn total(&self) -> u128 {
        self.counts.iter().map(|&c| c as u128).sum()
    }

    /// Number of values with a non-zero count.
    pub fn occupied(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }
}
