//! Expected number of extra deposits per eta bin and the randomized rounding
//! that turns it into an integer draw count.

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::error::{CorrectionError, Result};

/// Largest expectation whose rounded-up draw count fits in a `u32`
pub const MAX_EXPECTED: f64 = (u32::MAX - 1) as f64;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtraMultiplicity {
    expected: Vec<f64>,
}

impl ExtraMultiplicity {
    /// Validate one non-negative expectation per eta bin
    pub fn new(name: &str, expected: Vec<f64>, n_eta_bins: usize) -> Result<Self> {
        if expected.len() != n_eta_bins {
            return Err(CorrectionError::LengthMismatch {
                context: "extra_multiplicity",
                expected: n_eta_bins,
                got: expected.len(),
            });
        }

        if let Some(idx) = expected.iter().position(|m| !m.is_finite() || *m < 0.0) {
            return Err(CorrectionError::InvalidVector {
                name: name.to_string(),
                reason: format!(
                    "entry {idx} ({}) must be finite and non-negative",
                    expected[idx]
                ),
            });
        }

        // The rounded-up draw count must still fit in a u32
        if let Some(idx) = expected.iter().position(|&m| m > MAX_EXPECTED) {
            return Err(CorrectionError::InvalidVector {
                name: name.to_string(),
                reason: format!(
                    "entry {idx} ({}) exceeds the largest supported multiplicity {MAX_EXPECTED}",
                    expected[idx]
                ),
            });
        }

        Ok(Self { expected })
    }

    pub fn expected(&self, eta_bin: usize) -> f64 {
        self.expected[eta_bin]
    }

    /// Draw how many deposits to inject for `eta_bin`
    ///
    /// Always consumes exactly one uniform draw. The floor of the expectation
    /// is always taken, and one more is added with probability equal to the
    /// fractional part, so the mean count equals the expectation and an
    /// integral expectation is returned unchanged.
    pub fn draw_count<R: Rng + ?Sized>(&self, eta_bin: usize, rng: &mut R) -> u32 {
        let expected = self.expected[eta_bin];
        let base = expected.floor();
        let frac = expected - base;

        let u = Uniform::new(0.0, 1.0).sample(rng);
        let n = base as u32;
        if u < frac {
            n.saturating_add(1)
        } else {
            n
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_integral_expectation_is_exact() {
        let mult = ExtraMultiplicity::new("m", vec![0.0, 2.0, 5.0], 3).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            assert_eq!(mult.draw_count(0, &mut rng), 0);
            assert_eq!(mult.draw_count(1, &mut rng), 2);
            assert_eq!(mult.draw_count(2, &mut rng), 5);
        }
    }

    #[test]
    fn test_fractional_expectation_mean() {
        let mult = ExtraMultiplicity::new("m", vec![1.3], 1).unwrap();
        let mut rng = StdRng::seed_from_u64(2026);
        let n = 50_000;
        let mut total = 0u64;
        for _ in 0..n {
            let count = mult.draw_count(0, &mut rng);
            assert!(count == 1 || count == 2);
            total += count as u64;
        }
        let mean = total as f64 / n as f64;
        assert!((mean - 1.3).abs() < 0.01, "mean draw count {mean}");
    }

    #[test]
    fn test_consumes_one_uniform_per_call() {
        let mult = ExtraMultiplicity::new("m", vec![0.0], 1).unwrap();
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);

        mult.draw_count(0, &mut a);
        let _: f64 = Uniform::new(0.0, 1.0).sample(&mut b);
        assert_eq!(a.gen::<u64>(), b.gen::<u64>());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            ExtraMultiplicity::new("m", vec![1.0], 2),
            Err(CorrectionError::LengthMismatch {
                expected: 2,
                got: 1,
                ..
            })
        ));
        assert!(ExtraMultiplicity::new("m", vec![-0.1], 1).is_err());
        assert!(ExtraMultiplicity::new("m", vec![f64::NAN], 1).is_err());
    }

    #[test]
    fn test_huge_multiplicity_rejected() {
        assert!(matches!(
            ExtraMultiplicity::new("m", vec![4_294_967_295.5], 1),
            Err(CorrectionError::InvalidVector { .. })
        ));

        let mult = ExtraMultiplicity::new("m", vec![MAX_EXPECTED], 1).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(mult.draw_count(0, &mut rng), u32::MAX - 1);
    }
}
