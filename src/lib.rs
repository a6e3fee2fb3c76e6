//! # partition-select: differentially private partition selection
//!
//! In a grouped aggregation ("distinct users per category"), releasing a
//! group at all can reveal that a particular user exists. Partition selection
//! decides, per group, whether it may appear in the output, such that one user
//! who contributes to at most `Δ` groups changes every release probability by
//! at most a factor `e^ε` plus `δ`.
//!
//! ## Strategies
//!
//! - [`TruncatedGeometricPartitionSelection`] - Optimal keep probabilities, no noised count
//! - [`LaplacePartitionSelection`] - Laplace-noised count against a threshold
//! - [`GaussianPartitionSelection`] - Gaussian-noised count against a threshold
//!
//! ## High-Level API
//!
//! Build a strategy by name with [`create_partition_strategy`] and query it
//! through [`PartitionSelection`], or drive a whole batch of partitions with
//! [`PartitionSelector`] (sequential, seeded) or
//! [`selector::select_parallel`] (rayon).
//!
//! ```rust
//! use partition_select::{create_partition_strategy, PartitionSelection};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let strategy = create_partition_strategy("truncated_geometric", 1.0, 1e-5, 1).unwrap();
//! assert!(strategy.probability_of_keep(0) <= strategy.delta());
//!
//! let mut rng = ChaCha20Rng::seed_from_u64(0);
//! let _kept = strategy.should_keep(10, &mut rng);
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod math;
pub mod params;
pub mod selector;
pub mod strategies;
pub mod verification;

// Re-exports
pub use config::SelectionConfig;
pub use error::{Result, SelectionError};
pub use params::PartitionSelectionParameters;
pub use selector::{PartitionSelector, SelectedPartition, SelectionStats};
pub use strategies::{
    create_partition_strategy, GaussianPartitionSelection, LaplacePartitionSelection, Mechanism,
    PartitionSelection, PartitionStrategy, TruncatedGeometricPartitionSelection,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Python bindings via PyO3
#[cfg(feature = "python")]
mod python {
    use pyo3::exceptions::{PyNotImplementedError, PyValueError};
    use pyo3::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use crate::{PartitionSelection, PartitionStrategy, SelectionError};

    fn selection_err(e: SelectionError) -> PyErr {
        match e {
            SelectionError::UnsupportedOperation { .. } => {
                PyNotImplementedError::new_err(e.to_string())
            }
            other => PyValueError::new_err(other.to_string()),
        }
    }

    #[pyclass(name = "PartitionSelectionStrategy")]
    struct PyPartitionStrategy {
        inner: PartitionStrategy,
        rng: ChaCha20Rng,
    }

    #[pymethods]
    impl PyPartitionStrategy {
        #[getter]
        fn epsilon(&self) -> f64 {
            self.inner.epsilon()
        }

        #[getter]
        fn delta(&self) -> f64 {
            self.inner.delta()
        }

        #[getter]
        fn max_partitions_contributed(&self) -> u32 {
            self.inner.max_partitions_contributed()
        }

        #[getter]
        fn threshold(&self) -> PyResult<f64> {
            self.inner.threshold().map_err(selection_err)
        }

        fn probability_of_keep(&self, num_users: u64) -> f64 {
            self.inner.probability_of_keep(num_users)
        }

        fn should_keep(&mut self, num_users: u64) -> bool {
            self.inner.should_keep(num_users, &mut self.rng)
        }

        fn noised_value_if_should_keep(&mut self, num_users: u64) -> PyResult<Option<f64>> {
            self.inner
                .noised_value_if_should_keep(num_users, &mut self.rng)
                .map_err(selection_err)
        }

        fn __repr__(&self) -> String {
            format!(
                concat!(
                    "PartitionSelectionStrategy(mechanism='{}', epsilon={}, delta={}, ",
                    "max_partitions_contributed={})"
                ),
                self.inner.mechanism(),
                self.inner.epsilon(),
                self.inner.delta(),
                self.inner.max_partitions_contributed()
            )
        }
    }

    #[pyfunction]
    #[pyo3(signature = (mechanism, epsilon, delta, max_partitions_contributed, seed=None))]
    fn create_partition_strategy(
        mechanism: &str,
        epsilon: f64,
        delta: f64,
        max_partitions_contributed: u32,
        seed: Option<u64>,
    ) -> PyResult<PyPartitionStrategy> {
        let inner =
            crate::create_partition_strategy(mechanism, epsilon, delta, max_partitions_contributed)
                .map_err(selection_err)?;
        let rng = match seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        Ok(PyPartitionStrategy { inner, rng })
    }

    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_class::<PyPartitionStrategy>()?;
        m.add_function(wrap_pyfunction!(create_partition_strategy, m)?)?;
        Ok(())
    }
}
