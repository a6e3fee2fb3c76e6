//! Numerical checks of the guarantees a strategy must provide.
//!
//! A user who contributes to a partition moves its count by exactly one, so
//! the neighbouring relation per partition is `n` vs `n + 1`. For both the
//! "kept" and the "dropped" event the probability may grow by at most a
//! factor `e^ε'` plus `δ'`.

use crate::error::{Result, SelectionError};
use crate::math::delta::{adjusted_delta, adjusted_epsilon};
use crate::strategies::{Mechanism, PartitionSelection};

/// Relative slack granted to `δ'` for rounding in tight strategies.
const DELTA_SLACK: f64 = 1e-6;

/// Budget `(ε', δ')` a single partition must respect between `n` and `n + 1`.
///
/// Truncated geometric and Laplace split the budget evenly over the `Δ`
/// partitions. Gaussian noise is calibrated jointly on the L2 norm `√Δ` of a
/// user's contribution, so one coordinate alone is held to the full `(ε, δ)`.
pub fn neighbouring_budget<S: PartitionSelection>(strategy: &S) -> (f64, f64) {
    let k = strategy.max_partitions_contributed();
    match strategy.mechanism() {
        Mechanism::Gaussian => (strategy.epsilon(), strategy.delta()),
        Mechanism::TruncatedGeometric | Mechanism::Laplace => (
            adjusted_epsilon(strategy.epsilon(), k),
            adjusted_delta(strategy.delta(), k),
        ),
    }
}

/// Verify the `(ε', δ')` inequalities for every adjacent pair up to `max_users`.
///
/// # Errors
///
/// [`SelectionError::ContractViolation`] naming the first offending count.
pub fn check_privacy_contract<S: PartitionSelection>(strategy: &S, max_users: u64) -> Result<()> {
    let (eps, delta) = neighbouring_budget(strategy);
    let factor = eps.exp();
    let allowance = delta * (1.0 + DELTA_SLACK);

    let mut prev = strategy.probability_of_keep(0);
    for n in 0..max_users {
        let next = strategy.probability_of_keep(n + 1);
        let keep_gap = next - (factor * prev + allowance);
        let drop_gap = (1.0 - prev) - (factor * (1.0 - next) + allowance);
        if keep_gap > 0.0 || drop_gap > 0.0 {
            return Err(SelectionError::ContractViolation(format!(
                "{} strategy: counts {} -> {} give keep {} -> {} (epsilon'={}, delta'={})",
                strategy.mechanism(),
                n,
                n + 1,
                prev,
                next,
                eps,
                delta
            )));
        }
        prev = next;
    }
    Ok(())
}

/// Verify that the keep probability never decreases on `0..=max_users`.
pub fn check_monotonic<S: PartitionSelection>(strategy: &S, max_users: u64) -> Result<()> {
    let mut prev = strategy.probability_of_keep(0);
    for n in 1..=max_users {
        let next = strategy.probability_of_keep(n);
        if next < prev {
            return Err(SelectionError::ContractViolation(format!(
                "{} strategy: keep probability drops from {} to {} at {} users",
                strategy.mechanism(),
                prev,
                next,
                n
            )));
        }
        prev = next;
    }
    Ok(())
}

/// Verify that an empty partition is kept with probability at most `δ`.
pub fn check_empty_partition_bound<S: PartitionSelection>(strategy: &S) -> Result<()> {
    let p = strategy.probability_of_keep(0);
    if p > strategy.delta() {
        return Err(SelectionError::ContractViolation(format!(
            "{} strategy keeps empty partitions with probability {} > delta {}",
            strategy.mechanism(),
            p,
            strategy.delta()
        )));
    }
    Ok(())
}
