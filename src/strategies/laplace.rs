//! Laplace thresholding partition selection
//!
//! Adds `Laplace(0, Δ/ε)` noise to the user count and keeps the partition if
//! the noised count reaches `τ`. The threshold is placed so that a partition
//! with a single user survives with probability exactly the per-partition
//! delta.

use rand::Rng;
use tracing::debug;

use super::{Mechanism, PartitionSelection};
use crate::error::{Result, SelectionError};
use crate::math::delta::adjusted_delta;
use crate::math::noise::{LaplaceNoise, NoiseSampler};
use crate::params::PartitionSelectionParameters;

/// Laplace-noised count compared against a calibrated threshold.
#[derive(Clone, Debug)]
pub struct LaplacePartitionSelection {
    params: PartitionSelectionParameters,
    threshold: f64,
    noise: LaplaceNoise,
}

impl LaplacePartitionSelection {
    /// Compute the noise scale and threshold.
    pub fn new(params: PartitionSelectionParameters) -> Result<Self> {
        let max_partitions = params.max_partitions_contributed();
        let scale = f64::from(max_partitions) / params.epsilon();
        let noise = LaplaceNoise::new(scale)?;
        let delta = adjusted_delta(params.delta(), max_partitions);

        // Invert the Laplace CDF at 1 - δ' and shift by one user.
        let threshold = if delta <= 0.5 {
            1.0 - scale * (2.0 * delta).ln()
        } else {
            1.0 + scale * (2.0 * (1.0 - delta)).ln()
        };
        if !threshold.is_finite() {
            return Err(SelectionError::Calibration(format!(
                "Laplace threshold is not finite (scale={}, adjusted_delta={})",
                scale, delta
            )));
        }

        debug!(
            scale,
            threshold,
            adjusted_delta = delta,
            "calibrated laplace partition selection"
        );

        Ok(Self {
            params,
            threshold,
            noise,
        })
    }

    /// Laplace scale `b = Δ / ε`.
    pub fn scale(&self) -> f64 {
        self.noise.scale()
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

impl PartitionSelection for LaplacePartitionSelection {
    fn mechanism(&self) -> Mechanism {
        Mechanism::Laplace
    }

    fn parameters(&self) -> &PartitionSelectionParameters {
        &self.params
    }

    fn probability_of_keep(&self, num_users: u64) -> f64 {
        let scale = self.scale();
        let gap = num_users as f64 - self.threshold;
        if gap < 0.0 {
            0.5 * (gap / scale).exp()
        } else {
            1.0 - 0.5 * (-gap / scale).exp()
        }
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
