//! File-driven selection setup.
//!
//! ```toml
//! mechanism = "gaussian"
//! epsilon = 1.0
//! delta = 1e-5
//! max_partitions_contributed = 3
//! # seed = 42   # reproducible noise, tests only
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::{Result, SelectionError};
use crate::params::PartitionSelectionParameters;
use crate::selector::PartitionSelector;
use crate::strategies::{Mechanism, PartitionStrategy};

/// Mechanism, budget and optional RNG seed for a selection run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Which strategy to build.
    pub mechanism: Mechanism,
    /// Total epsilon.
    pub epsilon: f64,
    /// Total delta.
    pub delta: f64,
    /// Partitions a single user may touch.
    #[serde(default = "default_max_partitions_contributed")]
    pub max_partitions_contributed: u32,
    /// Fixed seed for the selector RNG. Absent means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

const fn default_max_partitions_contributed() -> u32 {
    1
}

/// Document shape before the mechanism name is resolved, so an unknown name
/// surfaces as [`SelectionError::UnknownMechanism`] like it does in the factory.
#[derive(Deserialize)]
struct RawSelectionConfig {
    mechanism: String,
    epsilon: f64,
    delta: f64,
    #[serde(default = "default_max_partitions_contributed")]
    max_partitions_contributed: u32,
    #[serde(default)]
    seed: Option<u64>,
}

impl TryFrom<RawSelectionConfig> for SelectionConfig {
    type Error = SelectionError;

    fn try_from(raw: RawSelectionConfig) -> Result<Self> {
        let config = Self {
            mechanism: raw.mechanism.parse()?,
            epsilon: raw.epsilon,
            delta: raw.delta,
            max_partitions_contributed: raw.max_partitions_contributed,
            seed: raw.seed,
        };
        config.validate()?;
        Ok(config)
    }
}

impl SelectionConfig {
    /// Parse a JSON document and validate the budget.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let raw: RawSelectionConfig = serde_json::from_str(s)?;
        Self::try_from(raw)
    }

    /// Parse a TOML document and validate the budget.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: RawSelectionConfig = toml::from_str(s)?;
        Self::try_from(raw)
    }

    /// Read a config file; `.json` is parsed as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            SelectionError::Config(format!("unable to read {}: {}", path.display(), e))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_toml_str(&contents),
        }
    }

    /// Validated privacy parameters.
    pub fn parameters(&self) -> Result<PartitionSelectionParameters> {
        PartitionSelectionParameters::new(self.epsilon, self.delta, self.max_partitions_contributed)
    }

    /// Check the budget without calibrating anything.
    pub fn validate(&self) -> Result<()> {
        self.parameters().map(|_| ())
    }

    /// Calibrate the configured strategy.
    pub fn build_strategy(&self) -> Result<PartitionStrategy> {
        PartitionStrategy::new(self.mechanism, self.parameters()?)
    }

    /// Calibrate the strategy and attach a generator.
    pub fn build_selector(&self) -> Result<PartitionSelector> {
        let strategy = self.build_strategy()?;
        Ok(match self.seed {
            Some(seed) => {
                warn!(
                    seed,
                    mechanism = %self.mechanism,
                    "selector seeded from config; noise is reproducible and unfit for real releases"
                );
                PartitionSelector::from_seed(strategy, seed)
            }
            None => PartitionSelector::from_entropy(strategy),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::PartitionSelection;

    #[test]
    fn test_from_toml() {
        let config = SelectionConfig::from_toml_str(
            r#"
            mechanism = "truncated_geometric"
            epsilon = 0.2
            delta = 1e-7
            max_partitions_contributed = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.mechanism, Mechanism::TruncatedGeometric);
        assert_eq!(config.seed, None);

        let s = config.build_strategy().unwrap();
        let p = s.probability_of_keep(700);
        assert!((p - 0.5800625857189882).abs() < 1e-12);
    }

    #[test]
    fn test_from_json_defaults() {
        let config = SelectionConfig::from_json_str(
            r#"{"mechanism": "laplace", "epsilon": 1.0, "delta": 1e-5}"#,
        )
        .unwrap();
        assert_eq!(config.max_partitions_contributed, 1);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_invalid_budget_rejected_at_parse() {
        let err = SelectionConfig::from_json_str(
            r#"{"mechanism": "laplace", "epsilon": -1.0, "delta": 1e-5}"#,
        )
        .unwrap_err();
        assert_eq!(err, SelectionError::InvalidEpsilon(-1.0));
    }

    #[test]
    fn test_unknown_mechanism_matches_factory_error() {
        let expected = SelectionError::UnknownMechanism("exponential".into());
        let err = SelectionConfig::from_toml_str(
            r#"
            mechanism = "exponential"
            epsilon = 1.0
            delta = 1e-5
            "#,
        )
        .unwrap_err();
        assert_eq!(err, expected);

        let err = SelectionConfig::from_json_str(
            r#"{"mechanism": "exponential", "epsilon": 1.0, "delta": 1e-5}"#,
        )
        .unwrap_err();
        assert_eq!(err, expected);

        let err = crate::create_partition_strategy("exponential", 1.0, 1e-5, 1).unwrap_err();
        assert_eq!(err, expected);
    }

    #[test]
    fn test_malformed_document_is_config_error() {
        let err = SelectionConfig::from_toml_str("epsilon = 1.0\ndelta = 1e-5\n").unwrap_err();
        assert!(matches!(err, SelectionError::Config(_)), "{:?}", err);
    }

    #[test]
    fn test_seeded_selectors_agree() {
        let config = SelectionConfig {
            mechanism: Mechanism::Gaussian,
            epsilon: 1.0,
            delta: 1e-5,
            max_partitions_contributed: 1,
            seed: Some(123),
        };
        let parts: Vec<(u32, u64)> = (0..100).map(|i| (i, 12)).collect();
        let a = config.build_selector().unwrap().select(parts.clone());
        let b = config.build_selector().unwrap().select(parts);
        assert_eq!(a, b);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir()
            .join(format!("partition-select-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"mechanism": "gaussian", "epsilon": 1.0, "delta": 1e-5, "seed": 5}"#,
        )
        .unwrap();
        let config = SelectionConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.mechanism, Mechanism::Gaussian);
        assert_eq!(config.seed, Some(5));
    }
}
