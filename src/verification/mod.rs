//! Verification primitives for partition selection strategies.
//!
//! - [`privacy_contract`] - neighbouring-count inequality, monotonicity and
//!   empty-partition checks
//! - [`audit`] - Append-only calibration audit log

pub mod audit;
pub mod privacy_contract;

pub use audit::{AuditLog, CalibrationAuditEntry};
pub use privacy_contract::{
    check_empty_partition_bound, check_monotonic, check_privacy_contract, neighbouring_budget,
};
