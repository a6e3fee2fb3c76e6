//! Truncated geometric partition selection
//!
//! Keeps a partition with the largest probability allowed by `(ε, δ)`-DP at
//! every user count (Desfontaines, Voss, Gipson, Mandayam 2020,
//! "Differentially private partition selection"). The keep probability obeys
//! the recurrence
//!
//! ```text
//! π(0) = 0
//! π(n) = min(e^ε' π(n-1) + δ', 1 - e^-ε' (1 - π(n-1) - δ'), 1)
//! ```
//!
//! with `ε'`, `δ'` the per-partition budget. The first branch (geometric
//! growth) is active up to a crossover count `c`; after it the second branch
//! drives the drop probability down geometrically. Both phases have closed
//! forms, so evaluation is O(1).

use rand::Rng;
use tracing::debug;

use super::{unsupported, Mechanism, PartitionSelection};
use crate::error::{Result, SelectionError};
use crate::math::delta::{adjusted_delta, adjusted_epsilon};
use crate::params::PartitionSelectionParameters;

/// Noise-free partition selection with optimal keep probabilities.
#[derive(Clone, Debug)]
pub struct TruncatedGeometricPartitionSelection {
    params: PartitionSelectionParameters,
    adjusted_epsilon: f64,
    adjusted_delta: f64,
    // e^ε' - 1
    growth: f64,
    crossover: u64,
    crossover_drop: f64,
    drop_fixed_point: f64,
}

impl TruncatedGeometricPartitionSelection {
    /// Precompute the closed-form constants.
    pub fn new(params: PartitionSelectionParameters) -> Result<Self> {
        let eps = adjusted_epsilon(params.epsilon(), params.max_partitions_contributed());
        let delta = adjusted_delta(params.delta(), params.max_partitions_contributed());
        let growth = eps.exp_m1();

        if !(eps > 0.0 && delta > 0.0 && growth.is_finite() && growth > 0.0) {
            return Err(SelectionError::Calibration(format!(
                "degenerate per-partition budget: epsilon={}, delta={}",
                eps, delta
            )));
        }

        // π at which both recurrence branches agree.
        let crossover_probability = (1.0 - delta) / (1.0 + eps.exp());
        let steps = ((crossover_probability * growth / delta).ln_1p() / eps).floor();
        // Float-to-int casts saturate; a crossover past u64::MAX is never reached.
        let crossover = (steps as u64).saturating_add(1);

        let crossover_keep = Self::growth_phase(delta, eps, growth, crossover);
        // Fixed point of the drop-probability recurrence, negative so that the
        // drop probability reaches zero after finitely many steps.
        let drop_fixed_point = -delta / growth;

        debug!(
            adjusted_epsilon = eps,
            adjusted_delta = delta,
            crossover,
            crossover_keep,
            "calibrated truncated geometric partition selection"
        );

        Ok(Self {
            params,
            adjusted_epsilon: eps,
            adjusted_delta: delta,
            growth,
            crossover,
            crossover_drop: 1.0 - crossover_keep,
            drop_fixed_point,
        })
    }

    /// User count at which the keep probability stops growing geometrically.
    pub fn crossover(&self) -> u64 {
        self.crossover
    }

    /// Per-partition epsilon `ε / Δ`.
    pub fn adjusted_epsilon(&self) -> f64 {
        self.adjusted_epsilon
    }

    /// Per-partition delta `1 - (1 - δ)^(1/Δ)`.
    pub fn adjusted_delta(&self) -> f64 {
        self.adjusted_delta
    }

    // π(n) = δ' (e^{nε'} - 1) / (e^ε' - 1), the sum of a geometric series.
    fn growth_phase(delta: f64, eps: f64, growth: f64, n: u64) -> f64 {
        (delta * (n as f64 * eps).exp_m1() / growth).min(1.0)
    }
}

impl PartitionSelection for TruncatedGeometricPartitionSelection {
    fn mechanism(&self) -> Mechanism {
        Mechanism::TruncatedGeometric
    }

    fn parameters(&self) -> &PartitionSelectionParameters {
        &self.params
    }

    fn probability_of_keep(&self, num_users: u64) -> f64 {
        if num_users == 0 {
            return 0.0;
        }
        if num_users <= self.crossover {
            return Self::growth_phase(
                self.adjusted_delta,
                self.adjusted_epsilon,
                self.growth,
                num_users,
            );
        }
        let past = (num_users - self.crossover) as f64;
        let drop = (self.crossover_drop - self.drop_fixed_point)
            * (-past * self.adjusted_epsilon).exp()
            + self.drop_fixed_point;
        (1.0 - drop).clamp(0.0, 1.0)
    }

    fn should_keep<R: Rng + ?Sized>(&self, num_users: u64, rng: &mut R) -> bool {
        // Uniform draws lie in [0, 1), so p = 0 never keeps and p = 1 always does.
        rng.gen::<f64>() < self.probability_of_keep(num_users)
    }

    fn threshold(&self) -> Result<f64> {
        Err(unsupported("threshold", Mechanism::TruncatedGeometric))
    }

    fn noised_value_if_should_keep<R: Rng + ?Sized>(
        &self,
        _num_users: u64,
        _rng: &mut R,
    ) -> Result<Option<f64>> {
        Err(unsupported(
            "noised_value_if_should_keep",
            Mechanism::TruncatedGeometric,
        ))
    }
}
