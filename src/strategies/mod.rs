//! Partition selection strategies.
//!
//! Each strategy turns a partition's true distinct-user count into a
//! keep/drop decision that is `(ε, δ)`-differentially private with respect to
//! a single user who contributes to at most `Δ` partitions.
//!
//! | Strategy | Noised count | Threshold |
//! |----------|--------------|-----------|
//! | [`TruncatedGeometricPartitionSelection`] | no | no |
//! | [`LaplacePartitionSelection`] | yes | yes |
//! | [`GaussianPartitionSelection`] | yes | yes |
//!
//! Build one by name with [`create_partition_strategy`], or from a
//! [`Mechanism`] with [`PartitionStrategy::new`].

pub mod gaussian;
pub mod laplace;
pub mod truncated_geometric;

pub use gaussian::GaussianPartitionSelection;
pub use laplace::LaplacePartitionSelection;
pub use truncated_geometric::TruncatedGeometricPartitionSelection;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SelectionError};
use crate::params::PartitionSelectionParameters;

/// Partition selection mechanism.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mechanism {
    /// Optimal keep probabilities, no noise and no threshold
    TruncatedGeometric,
    /// Laplace-noised count against a threshold
    Laplace,
    /// Gaussian-noised count against a threshold
    Gaussian,
}

impl Mechanism {
    /// All mechanisms, in a stable order.
    pub const ALL: [Mechanism; 3] = [
        Mechanism::TruncatedGeometric,
        Mechanism::Laplace,
        Mechanism::Gaussian,
    ];

    /// Identifier accepted by [`create_partition_strategy`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Mechanism::TruncatedGeometric => "truncated_geometric",
            Mechanism::Laplace => "laplace",
            Mechanism::Gaussian => "gaussian",
        }
    }

    /// Whether kept partitions come with a noised count.
    pub fn reports_noised_value(&self) -> bool {
        !matches!(self, Mechanism::TruncatedGeometric)
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mechanism {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "truncated_geometric" => Ok(Mechanism::TruncatedGeometric),
            "laplace" => Ok(Mechanism::Laplace),
            "gaussian" => Ok(Mechanism::Gaussian),
            other => Err(SelectionError::UnknownMechanism(other.to_string())),
        }
    }
}

/// Capability set shared by every strategy.
///
/// Implementations are immutable after construction. All randomness comes
/// from the `rng` argument, so one strategy can be shared across threads that
/// each hold their own generator.
pub trait PartitionSelection {
    /// Which mechanism this strategy implements.
    fn mechanism(&self) -> Mechanism;

    /// Validated construction parameters.
    fn parameters(&self) -> &PartitionSelectionParameters;

    /// Total epsilon, as passed at construction.
    fn epsilon(&self) -> f64 {
        self.parameters().epsilon()
    }

    /// Total delta, as passed at construction.
    fn delta(&self) -> f64 {
        self.parameters().delta()
    }

    /// Contribution bound `Δ`, as passed at construction.
    fn max_partitions_contributed(&self) -> u32 {
        self.parameters().max_partitions_contributed()
    }

    /// Exact probability that a partition with `num_users` distinct users is kept.
    ///
    /// Non-decreasing in `num_users`, and at most `delta` for zero users.
    fn probability_of_keep(&self, num_users: u64) -> f64;

    /// One independent keep/drop trial for `num_users`.
    fn should_keep<R: Rng + ?Sized>(&self, num_users: u64, rng: &mut R) -> bool;

    /// Calibrated threshold on the noised count.
    ///
    /// # Errors
    ///
    /// [`SelectionError::UnsupportedOperation`] for truncated geometric.
    fn threshold(&self) -> Result<f64>;

    /// Noise the count and return it if it clears the threshold.
    ///
    /// # Errors
    ///
    /// [`SelectionError::UnsupportedOperation`] for truncated geometric.
    fn noised_value_if_should_keep<R: Rng + ?Sized>(
        &self,
        num_users: u64,
        rng: &mut R,
    ) -> Result<Option<f64>>;
}

/// One of the three calibrated strategies.
#[derive(Clone, Debug)]
pub enum PartitionStrategy {
    /// See [`TruncatedGeometricPartitionSelection`]
    TruncatedGeometric(TruncatedGeometricPartitionSelection),
    /// See [`LaplacePartitionSelection`]
    Laplace(LaplacePartitionSelection),
    /// See [`GaussianPartitionSelection`]
    Gaussian(GaussianPartitionSelection),
}

impl PartitionStrategy {
    /// Calibrate the strategy for `mechanism` under `params`.
    pub fn new(mechanism: Mechanism, params: PartitionSelectionParameters) -> Result<Self> {
        Ok(match mechanism {
            Mechanism::TruncatedGeometric => PartitionStrategy::TruncatedGeometric(
                TruncatedGeometricPartitionSelection::new(params)?,
            ),
            Mechanism::Laplace => {
                PartitionStrategy::Laplace(LaplacePartitionSelection::new(params)?)
            }
            Mechanism::Gaussian => {
                PartitionStrategy::Gaussian(GaussianPartitionSelection::new(params)?)
            }
        })
    }

    /// Scale of the noise added to counts (`b` for Laplace, `σ` for Gaussian).
    pub fn noise_scale(&self) -> Option<f64> {
        match self {
            PartitionStrategy::TruncatedGeometric(_) => None,
            PartitionStrategy::Laplace(s) => Some(s.scale()),
            PartitionStrategy::Gaussian(s) => Some(s.sigma()),
        }
    }
}

impl PartitionSelection for PartitionStrategy {
    fn mechanism(&self) -> Mechanism {
        match self {
            PartitionStrategy::TruncatedGeometric(s) => s.mechanism(),
            PartitionStrategy::Laplace(s) => s.mechanism(),
            PartitionStrategy::Gaussian(s) => s.mechanism(),
        }
    }

    fn parameters(&self) -> &PartitionSelectionParameters {
        match self {
            PartitionStrategy::TruncatedGeometric(s) => s.parameters(),
            PartitionStrategy::Laplace(s) => s.parameters(),
            PartitionStrategy::Gaussian(s) => s.parameters(),
        }
    }

    fn probability_of_keep(&self, num_users: u64) -> f64 {
        match self {
            PartitionStrategy::TruncatedGeometric(s) => s.probability_of_keep(num_users),
            PartitionStrategy::Laplace(s) => s.probability_of_keep(num_users),
            PartitionStrategy::Gaussian(s) => s.probability_of_keep(num_users),
        }
    }

    fn should_keep<R: Rng + ?Sized>(&self, num_users: u64, rng: &mut R) -> bool {
        match self {
            PartitionStrategy::TruncatedGeometric(s) => s.should_keep(num_users, rng),
            PartitionStrategy::Laplace(s) => s.should_keep(num_users, rng),
            PartitionStrategy::Gaussian(s) => s.should_keep(num_users, rng),
        }
    }

    fn threshold(&self) -> Result<f64> {
        match self {
            PartitionStrategy::TruncatedGeometric(s) => s.threshold(),
            PartitionStrategy::Laplace(s) => s.threshold(),
            PartitionStrategy::Gaussian(s) => s.threshold(),
        }
    }

    fn noised_value_if_should_keep<R: Rng + ?Sized>(
        &self,
        num_users: u64,
        rng: &mut R,
    ) -> Result<Option<f64>> {
        match self {
            PartitionStrategy::TruncatedGeometric(s) => {
                s.noised_value_if_should_keep(num_users, rng)
            }
            PartitionStrategy::Laplace(s) => s.noised_value_if_should_keep(num_users, rng),
            PartitionStrategy::Gaussian(s) => s.noised_value_if_should_keep(num_users, rng),
        }
    }
}

/// Build a calibrated strategy from a mechanism name.
///
/// # Arguments
///
/// * `mechanism` - `"truncated_geometric"`, `"laplace"` or `"gaussian"` (exact match)
/// * `epsilon` - Total epsilon, finite and `> 0`
/// * `delta` - Total delta, in `(0, 1)`
/// * `max_partitions_contributed` - Partitions a single user may touch, `>= 1`
///
/// # Example
///
/// ```rust
/// use partition_select::{create_partition_strategy, PartitionSelection};
///
/// let strategy = create_partition_strategy("laplace", 1.0, 1e-5, 1).unwrap();
/// let p = strategy.probability_of_keep(10);
/// assert!((p - 0.08103083927575383).abs() < 1e-12);
/// assert!(strategy.threshold().is_ok());
/// ```
pub fn create_partition_strategy(
    mechanism: &str,
    epsilon: f64,
    delta: f64,
    max_partitions_contributed: u32,
) -> Result<PartitionStrategy> {
    let mechanism: Mechanism = mechanism.parse()?;
    let params = PartitionSelectionParameters::new(epsilon, delta, max_partitions_contributed)?;
    PartitionStrategy::new(mechanism, params)
}

/// Error returned by the noise-free strategy for noise-only operations.
pub(crate) fn unsupported(operation: &'static str, mechanism: Mechanism) -> SelectionError {
    SelectionError::UnsupportedOperation {
        operation,
        mechanism,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mechanism_round_trips_through_names() {
        for m in Mechanism::ALL {
            assert_eq!(m.as_str().parse::<Mechanism>().unwrap(), m);
            assert_eq!(m.to_string(), m.as_str());
        }
    }

    #[test]
    fn test_mechanism_names_are_exact() {
        for name in ["Laplace", "GAUSSIAN", " laplace", "geometric", ""] {
            let err = name.parse::<Mechanism>().unwrap_err();
            assert_eq!(err, SelectionError::UnknownMechanism(name.to_string()));
        }
    }

    #[test]
    fn test_mechanism_serde_uses_snake_case() {
        let json = serde_json::to_string(&Mechanism::TruncatedGeometric).unwrap();
        assert_eq!(json, "\"truncated_geometric\"");
        let back: Mechanism = serde_json::from_str("\"gaussian\"").unwrap();
        assert_eq!(back, Mechanism::Gaussian);
    }

    #[test]
    fn test_factory_dispatches_each_mechanism() {
        for m in Mechanism::ALL {
            let s = create_partition_strategy(m.as_str(), 1.0, 1e-5, 2).unwrap();
            assert_eq!(s.mechanism(), m);
            assert_eq!(s.noise_scale().is_some(), m.reports_noised_value());
            assert_eq!(s.threshold().is_ok(), m.reports_noised_value());
        }
    }

    #[test]
    fn test_factory_rejects_unknown_name_before_parameters() {
        // Both the name and epsilon are bad; the name is reported.
        let err = create_partition_strategy("poisson", -1.0, 1e-5, 1).unwrap_err();
        assert!(matches!(err, SelectionError::UnknownMechanism(_)));
    }

    #[test]
    fn test_factory_rejects_invalid_parameters() {
        for m in Mechanism::ALL {
            let name = m.as_str();
            assert!(create_partition_strategy(name, 0.0, 1e-5, 1)
                .unwrap_err()
                .is_invalid_parameter());
            assert!(create_partition_strategy(name, 1.0, 0.0, 1)
                .unwrap_err()
                .is_invalid_parameter());
            assert!(create_partition_strategy(name, 1.0, 1.0, 1)
                .unwrap_err()
                .is_invalid_parameter());
            assert!(create_partition_strategy(name, 1.0, 1e-5, 0)
                .unwrap_err()
                .is_invalid_parameter());
        }
    }
}
