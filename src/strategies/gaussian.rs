//! Gaussian thresholding partition selection
//!
//! Half of delta pays for the Gaussian noise itself, calibrated with the
//! analytic Gaussian mechanism at L2 sensitivity `√Δ` (each user moves at most
//! `Δ` counts by at most one). The other half bounds the chance that a
//! single-user partition clears the threshold.

use rand::Rng;
use tracing::debug;

use super::{Mechanism, PartitionSelection};
use crate::error::{Result, SelectionError};
use crate::math::delta::adjusted_delta;
use crate::math::gaussian::{calibrate_gaussian_sigma, normal_upper_tail, threshold_quantile};
use crate::math::noise::{GaussianNoise, NoiseSampler};
use crate::params::PartitionSelectionParameters;

/// Gaussian-noised count compared against a calibrated threshold.
#[derive(Clone, Debug)]
pub struct GaussianPartitionSelection {
    params: PartitionSelectionParameters,
    threshold: f64,
    noise: GaussianNoise,
}

impl GaussianPartitionSelection {
    /// Run the sigma search and place the threshold.
    pub fn new(params: PartitionSelectionParameters) -> Result<Self> {
        let epsilon = params.epsilon();
        let max_partitions = params.max_partitions_contributed();
        let noise_delta = params.delta() / 2.0;
        let threshold_delta = params.delta() - noise_delta;

        let l0 = f64::from(max_partitions);
        let (sigma, noise_iterations) = calibrate_gaussian_sigma(epsilon, noise_delta, l0.sqrt())?;
        let (threshold_sigma, threshold_iterations) =
            calibrate_gaussian_sigma(epsilon, noise_delta, l0)?;

        let tail = adjusted_delta(threshold_delta, max_partitions);
        let threshold = 1.0 + threshold_sigma * threshold_quantile(tail);
        if !threshold.is_finite() {
            return Err(SelectionError::Calibration(format!(
                "Gaussian threshold is not finite (sigma={}, tail={})",
                threshold_sigma, tail
            )));
        }

        debug!(
            sigma,
            threshold_sigma,
            threshold,
            noise_iterations,
            threshold_iterations,
            "calibrated gaussian partition selection"
        );

        Ok(Self {
            params,
            threshold,
            noise: GaussianNoise::new(sigma)?,
        })
    }

    /// Standard deviation of the noise added to counts.
    pub fn sigma(&self) -> f64 {
        self.noise.sigma()
    }

    /// Noised count if it reaches the threshold, `None` otherwise.
    pub fn kept_noised_value<R: Rng + ?Sized>(&self, num_users: u64, rng: &mut R) -> Option<f64> {
        let value = self.noised(num_users, rng);
        (value >= self.threshold).then_some(value)
    }

    fn noised<R: Rng + ?Sized>(&self, num_users: u64, rng: &mut R) -> f64 {
        num_users as f64 + self.noise.sample(rng)
    }
}

impl PartitionSelection for GaussianPartitionSelection {
    fn mechanism(&self) -> Mechanism {
        Mechanism::Gaussian
    }

    fn parameters(&self) -> &PartitionSelectionParameters {
        &self.params
    }

    fn probability_of_keep(&self, num_users: u64) -> f64 {
        normal_upper_tail((self.threshold - num_users as f64) / self.sigma())
    }

    fn should_keep<R: Rng + ?Sized>(&self, num_users: u64, rng: &mut R) -> bool {
        self.noised(num_users, rng) >= self.threshold
    }

    fn threshold(&self) -> Result<f64> {
        Ok(self.threshold)
    }

    fn noised_value_if_should_keep<R: Rng + ?Sized>(
        &self,
        num_users: u64,
        rng: &mut R,
    ) -> Result<Option<f64>> {
        Ok(self.kept_noised_value(num_users, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn strategy(epsilon: f64, delta: f64, max_partitions: u32) -> GaussianPartitionSelection {
        let params = PartitionSelectionParameters::new(epsilon, delta, max_partitions).unwrap();
        GaussianPartitionSelection::new(params).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        let rel = (actual - expected).abs() / expected;
        assert!(rel < 1e-9, "actual={} expected={} rel={}", actual, expected, rel);
    }

    #[test]
    fn test_known_probabilities() {
        assert_close(strategy(1.0, 1e-5, 1).probability_of_keep(10), 0.017845473615190732);
        assert_close(
            strategy(0.2, 1e-7, 10).probability_of_keep(1100),
            0.007884076914531857,
        );
    }

    #[test]
    fn test_single_partition_sigmas_coincide() {
        // With Δ = 1 both sensitivities are 1, so the threshold sits
        // Φc⁻¹(δ/2) standard deviations above one user.
        let s = strategy(1.0, 1e-5, 1);
        let z = threshold_quantile(5e-6);
        let expected = 1.0 + s.sigma() * z;
        assert!((s.threshold().unwrap() - expected).abs() < 1e-9);
        assert!((s.threshold().unwrap() - 18.159_682_022_25).abs() < 1e-6);
    }

    #[test]
    fn test_empty_partition_bound() {
        for (eps, delta, k) in [(1.0, 1e-5, 1), (0.2, 1e-7, 10), (3.0, 0.1, 5)] {
            let s = strategy(eps, delta, k);
            assert!(s.probability_of_keep(0) <= delta);
        }
    }

    #[test]
    fn test_noised_values_clear_threshold() {
        let s = strategy(1.0, 1e-5, 1);
        let tau = s.threshold().unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let mut kept = 0;
        for _ in 0..10_000 {
            if let Some(v) = s.noised_value_if_should_keep(12, &mut rng).unwrap() {
                assert!(v >= tau);
                kept += 1;
            }
        }
        assert!(kept > 0);
    }
}
