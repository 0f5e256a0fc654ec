extern crate alloc;
use alloc::vec::Vec;

use crate::error::LevelError;
use crate::histogram::Histogram;

/// Best single level for one interval and the error of collapsing it there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalFit {
    pub representative: u16,
    /// `Σ counts[x] · (x − representative)²` over the interval.
    pub error: u128,
}

/// O(1) squared-error queries for any closed interval `[a, b]` of a histogram.
///
/// Holds prefix sums of `counts[x]`, `x · counts[x]` and `x² · counts[x]`.
/// With counts bounded by `u64` and values by `u16`, every sum and every
/// intermediate of the closed form fits in `u128`, so errors are exact.
#[derive(Debug, Clone)]
pub struct IntervalCost {
    weight: Vec<u128>,
    moment: Vec<u128>,
    square: Vec<u128>,
}

impl IntervalCost {
    pub fn new(histogram: &Histogram) -> Result<Self, LevelError> {
        let n = histogram.len() + 1;
        let mut weight = try_table(n, 0u128)?;
        let mut moment = try_table(n, 0u128)?;
        let mut square = try_table(n, 0u128)?;

        for (x, &c) in histogram.counts().iter().enumerate() {
            let c = c as u128;
            let xv = x as u128;
            weight[x + 1] = weight[x] + c;
            moment[x + 1] = moment[x] + c * xv;
            square[x + 1] = square[x] + c * xv * xv;
        }

        Ok(Self {
            weight,
            moment,
            square,
        })
    }

    /// Domain size of the underlying histogram.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.weight.len() - 1
    }

    /// Total count inside `[a, b]`.
    pub fn weight(&self, a: usize, b: usize) -> u128 {
        self.weight[b + 1] - self.weight[a]
    }

    /// Error of collapsing `[a, b]` onto the value `level`.
    pub fn error_at(&self, a: usize, b: usize, level: u16) -> u128 {
        let s0 = self.weight(a, b);
        let s1 = self.moment[b + 1] - self.moment[a];
        let s2 = self.square[b + 1] - self.square[a];
        let r = level as u128;
        // Σc(x−r)² = s2 − 2r·s1 + r²·s0, non-negative, so subtract last.
        s2 + r * r * s0 - 2 * r * s1
    }

    /// Optimal integer representative of `[a, b]` and its error.
    ///
    /// The real-valued optimum is the weighted mean; the integer optimum is
    /// whichever of its floor and ceiling costs less, the floor on ties.
    /// An interval with no weight collapses onto `a` at zero cost.
    pub fn fit(&self, a: usize, b: usize) -> IntervalFit {
        debug_assert!(a <= b && b < self.len());
        let w = self.weight(a, b);
        if w == 0 {
            return IntervalFit {
                representative: a as u16,
                error: 0,
            };
        }

        let s1 = self.moment[b + 1] - self.moment[a];
        // floor(mean) lies in [a, b]; ceil(mean) too when the mean is fractional.
        let floor = (s1 / w) as u16;
        let floor_error = self.error_at(a, b, floor);
        if s1 % w == 0 {
            return IntervalFit {
                representative: floor,
                error: floor_error,
            };
        }

        let ceil = floor + 1;
        let ceil_error = self.error_at(a, b, ceil);
        if ceil_error < floor_error {
            IntervalFit {
                representative: ceil,
                error: ceil_error,
            }
        } else {
            IntervalFit {
                representative: floor,
                error: floor_error,
            }
        }
    }

    /// Just the error part of [`fit`](Self::fit).
    #[inline]
    pub fn error(&self, a: usize, b: usize) -> u128 {
        self.fit(a, b).error
    }
}

/// Allocate a table of `len` copies of `value`, reporting exhaustion as an error.
pub(crate) fn try_table<T: Clone>(len: usize, value: T) -> Result<Vec<T>, LevelError> {
    let mut table = Vec::new();
    table
        .try_reserve_exact(len)
        .map_err(|_| LevelError::AllocationFailure)?;
    table.resize(len, value);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn brute_fit(counts: &[u64], a: usize, b: usize) -> (u16, u128) {
        let mut best = (a as u16, u128::MAX);
        for r in a..=b {
            let e: u128 = (a..=b)
                .map(|x| {
                    let d = x.abs_diff(r) as u128;
                    counts[x] as u128 * d * d
                })
                .sum();
            if e < best.1 {
                best = (r as u16, e);
            }
        }
        best
    }

    #[test]
    fn three_spikes_mean() {
        let hist = Histogram::from_counts(vec![1, 0, 0, 1, 0, 0, 1]).unwrap();
        let cost = IntervalCost::new(&hist).unwrap();
        let fit = cost.fit(0, 6);
        assert_eq!(fit.representative, 3);
        assert_eq!(fit.error, 18);
    }

    #[test]
    fn empty_interval_collapses_to_start() {
        let hist = Histogram::from_counts(vec![5, 0, 0, 0, 2]).unwrap();
        let cost = IntervalCost::new(&hist).unwrap();
        assert_eq!(
            cost.fit(1, 3),
            IntervalFit {
                representative: 1,
                error: 0
            }
        );
    }

    #[test]
    fn singleton_is_exact() {
        let hist = Histogram::from_counts(vec![3, 9, 4]).unwrap();
        let cost = IntervalCost::new(&hist).unwrap();
        for v in 0..3 {
            let fit = cost.fit(v, v);
            assert_eq!(fit.representative as usize, v);
            assert_eq!(fit.error, 0);
        }
    }

    #[test]
    fn mean_rounding() {
        // mean = 1.0 exactly
        let hist = Histogram::from_counts(vec![1, 2, 1, 0]).unwrap();
        let cost = IntervalCost::new(&hist).unwrap();
        let fit = cost.fit(0, 3);
        assert_eq!(fit.representative, 1);
        assert_eq!(fit.error, 2);

        let hist = Histogram::from_counts(vec![0, 3, 0, 1]).unwrap();
        let cost = IntervalCost::new(&hist).unwrap();
        // mean = 1.5: floor 1 -> 4, ceil 2 -> 3+1 = 4, tie goes to floor
        let fit = cost.fit(0, 3);
        assert_eq!(fit.representative, 1);
        assert_eq!(fit.error, 4);

        // mean = 1.75: ceil wins
        let hist = Histogram::from_counts(vec![0, 1, 3]).unwrap();
        let cost = IntervalCost::new(&hist).unwrap();
        let fit = cost.fit(0, 2);
        assert_eq!(fit.representative, 2);
        assert_eq!(fit.error, 1);
    }

    #[test]
    fn matches_exhaustive_search() {
        let counts: Vec<u64> = (0..24u64).map(|i| (i * 7 + 3) % 11).collect();
        let hist = Histogram::from_counts(counts.clone()).unwrap();
        let cost = IntervalCost::new(&hist).unwrap();
        for a in 0..counts.len() {
            for b in a..counts.len() {
                let fit = cost.fit(a, b);
                let (_, brute_error) = brute_fit(&counts, a, b);
                assert_eq!(fit.error, brute_error, "interval [{a}, {b}]");
                assert_eq!(cost.error_at(a, b, fit.representative), fit.error);
                assert!((a..=b).contains(&(fit.representative as usize)));
            }
        }
    }

    #[test]
    fn large_counts_do_not_overflow() {
        let mut counts = vec![0u64; 65536];
        counts[0] = u64::MAX;
        counts[65535] = u64::MAX;
        let hist = Histogram::from_counts(counts).unwrap();
        let cost = IntervalCost::new(&hist).unwrap();
        let fit = cost.fit(0, 65535);
        // mean is 32767.5, both sides are equally far
        assert_eq!(fit.representative, 32767);
        let expected = u64::MAX as u128 * (32767u128 * 32767 + 32768 * 32768);
        assert_eq!(fit.error, expected);
    }
}
