//! Privacy parameters shared by every strategy.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SelectionError};

/// The `(epsilon, delta, max_partitions_contributed)` triple a strategy is
/// calibrated for.
///
/// Fields are private: the only way to obtain a value is [`new`](Self::new),
/// which validates once. Copies are cheap and never re-checked.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PartitionSelectionParameters {
    epsilon: f64,
    delta: f64,
    max_partitions_contributed: u32,
}

impl PartitionSelectionParameters {
    /// Validate and freeze a parameter triple.
    ///
    /// # Errors
    ///
    /// * [`SelectionError::InvalidEpsilon`] unless `epsilon` is finite and `> 0`
    /// * [`SelectionError::InvalidDelta`] unless `0 < delta < 1`
    /// * [`SelectionError::InvalidMaxPartitions`] if `max_partitions_contributed == 0`
    pub fn new(epsilon: f64, delta: f64, max_partitions_contributed: u32) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(SelectionError::InvalidEpsilon(epsilon));
        }
        // NaN fails both comparisons, so test containment rather than exclusion.
        if !(delta > 0.0 && delta < 1.0) {
            return Err(SelectionError::InvalidDelta(delta));
        }
        if max_partitions_contributed < 1 {
            return Err(SelectionError::InvalidMaxPartitions(
                max_partitions_contributed,
            ));
        }
        Ok(Self {
            epsilon,
            delta,
            max_partitions_contributed,
        })
    }

    /// Total epsilon budget.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Total delta budget.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Maximum number of partitions a single user may touch.
    pub fn max_partitions_contributed(&self) -> u32 {
        self.max_partitions_contributed
    }
}

// Deserialization goes through `new` so a config file cannot smuggle in an
// unchecked triple.
impl<'de> Deserialize<'de> for PartitionSelectionParameters {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            epsilon: f64,
            delta: f64,
            max_partitions_contributed: u32,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.epsilon, raw.delta, raw.max_partitions_contributed)
            .map_err(serde::de::Error::custom)
    }
}
