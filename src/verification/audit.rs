//! Calibration audit log.
//!
//! Records what each strategy was calibrated to so a release can be checked
//! after the fact: the budget that was spent and the constants it produced.

use serde::{Deserialize, Serialize};

use crate::strategies::{Mechanism, PartitionSelection, PartitionStrategy};

/// Calibration record for one constructed strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationAuditEntry {
    /// Mechanism that was calibrated.
    pub mechanism: Mechanism,
    /// Total epsilon.
    pub epsilon: f64,
    /// Total delta.
    pub delta: f64,
    /// Contribution bound `Δ`.
    pub max_partitions_contributed: u32,
    /// Threshold on the noised count (noise-based strategies only).
    pub threshold: Option<f64>,
    /// Laplace scale or Gaussian sigma (noise-based strategies only).
    pub noise_scale: Option<f64>,
}

impl CalibrationAuditEntry {
    /// Snapshot a calibrated strategy.
    pub fn from_strategy(strategy: &PartitionStrategy) -> Self {
        Self {
            mechanism: strategy.mechanism(),
            epsilon: strategy.epsilon(),
            delta: strategy.delta(),
            max_partitions_contributed: strategy.max_partitions_contributed(),
            threshold: strategy.threshold().ok(),
            noise_scale: strategy.noise_scale(),
        }
    }
}

/// Append-only log of calibrations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuditLog {
    entries: Vec<CalibrationAuditEntry>,
}

impl AuditLog {
    /// Create a new, empty audit log.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry to the log.
    pub fn push(&mut self, entry: CalibrationAuditEntry) {
        self.entries.push(entry);
    }

    /// Snapshot `strategy` and append it.
    pub fn record(&mut self, strategy: &PartitionStrategy) {
        self.push(CalibrationAuditEntry::from_strategy(strategy));
    }

    /// Get all entries.
    pub fn entries(&self) -> &[CalibrationAuditEntry] {
        &self.entries
    }

    /// Number of recorded calibrations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of epsilon over all recorded calibrations (basic composition).
    pub fn total_epsilon(&self) -> f64 {
        self.entries.iter().map(|e| e.epsilon).sum()
    }

    /// Serialize the audit log to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_partition_strategy;

    #[test]
    fn test_entry_captures_noise_constants() {
        let s = create_partition_strategy("laplace", 0.5, 1e-6, 2).unwrap();
        let entry = CalibrationAuditEntry::from_strategy(&s);
        assert_eq!(entry.mechanism, Mechanism::Laplace);
        assert_eq!(entry.max_partitions_contributed, 2);
        assert_eq!(entry.noise_scale, Some(4.0));
        assert_eq!(entry.threshold, s.threshold().ok());
    }

    #[test]
    fn test_truncated_geometric_entry_has_no_constants() {
        let s = create_partition_strategy("truncated_geometric", 1.0, 1e-5, 1).unwrap();
        let entry = CalibrationAuditEntry::from_strategy(&s);
        assert!(entry.threshold.is_none());
        assert!(entry.noise_scale.is_none());
    }

    #[test]
    fn test_log_accumulates() {
        let mut log = AuditLog::new();
        assert!(log.is_empty());
        for name in ["truncated_geometric", "laplace", "gaussian"] {
            log.record(&create_partition_strategy(name, 0.5, 1e-6, 1).unwrap());
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.entries()[2].mechanism, Mechanism::Gaussian);
        assert!((log.total_epsilon() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_json_round_trip() {
        let mut log = AuditLog::new();
        log.record(&create_partition_strategy("gaussian", 1.0, 1e-5, 3).unwrap());
        let json = log.to_json().unwrap();
        assert!(json.contains("\"gaussian\""));
        let restored: AuditLog = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), 1);
        let (a, b) = (&restored.entries()[0], &log.entries()[0]);
        assert_eq!(a.mechanism, b.mechanism);
        assert_eq!(a.max_partitions_contributed, 3);
        assert!((a.threshold.unwrap() - b.threshold.unwrap()).abs() < 1e-9);
    }
}
