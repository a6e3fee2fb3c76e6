//! Error types for partition selection

use thiserror::Error;

use crate::strategies::Mechanism;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SelectionError>;

/// All possible errors raised while building or querying a strategy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    /// Epsilon is not a finite, strictly positive number
    #[error("Invalid epsilon: {0} (must be finite and > 0)")]
    InvalidEpsilon(f64),

    /// Delta lies outside the open interval (0, 1)
    #[error("Invalid delta: {0} (must be in (0, 1))")]
    InvalidDelta(f64),

    /// A user must be allowed to contribute to at least one partition
    #[error("Invalid max_partitions_contributed: {0} (must be >= 1)")]
    InvalidMaxPartitions(u32),

    /// Mechanism identifier is not one of the supported names
    #[error("Unknown mechanism '{0}'. Use 'truncated_geometric', 'laplace', or 'gaussian'")]
    UnknownMechanism(String),

    /// Operation is not defined for this mechanism
    #[error("{operation} is not supported by the {mechanism} strategy")]
    UnsupportedOperation {
        /// Name of the rejected operation
        operation: &'static str,
        /// Mechanism the operation was called on
        mechanism: Mechanism,
    },

    /// Calibration produced a non-finite or non-positive constant
    #[error("Calibration failed: {0}")]
    Calibration(String),

    /// A strategy broke the neighbouring-count privacy inequality
    #[error("Privacy contract violated: {0}")]
    ContractViolation(String),

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SelectionError {
    /// Whether this error reports an out-of-range privacy parameter.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(
            self,
            SelectionError::InvalidEpsilon(_)
                | SelectionError::InvalidDelta(_)
                | SelectionError::InvalidMaxPartitions(_)
        )
    }
}

impl From<serde_json::Error> for SelectionError {
    fn from(e: serde_json::Error) -> Self {
        SelectionError::Config(e.to_string())
    }
}

impl From<toml::de::Error> for SelectionError {
    fn from(e: toml::de::Error) -> Self {
        SelectionError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_grouping() {
        assert!(SelectionError::InvalidEpsilon(0.0).is_invalid_parameter());
        assert!(SelectionError::InvalidDelta(1.0).is_invalid_parameter());
        assert!(SelectionError::InvalidMaxPartitions(0).is_invalid_parameter());
        assert!(!SelectionError::UnknownMechanism("x".into()).is_invalid_parameter());
    }

    #[test]
    fn test_unsupported_message_names_mechanism() {
        let err = SelectionError::UnsupportedOperation {
            operation: "threshold",
            mechanism: Mechanism::TruncatedGeometric,
        };
        assert_eq!(
            err.to_string(),
            "threshold is not supported by the truncated_geometric strategy"
        );
    }
}
