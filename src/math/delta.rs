//! Per-partition privacy budget.
//!
//! A user touching up to `Δ` partitions spends a `1/Δ` share of epsilon on
//! each one. Delta composes multiplicatively on the "no failure" event, so the
//! per-partition share solves `(1 - d)^Δ = 1 - δ`.

/// Epsilon available to a single partition: `ε / Δ`.
pub fn adjusted_epsilon(epsilon: f64, max_partitions_contributed: u32) -> f64 {
    epsilon / f64::from(max_partitions_contributed)
}

/// Delta available to a single partition: `1 - (1 - δ)^(1/Δ)`.
///
/// Evaluated through `log1p`/`expm1` because `δ` is routinely `1e-7` or smaller
/// and the naive power loses almost every significant digit.
pub fn adjusted_delta(delta: f64, max_partitions_contributed: u32) -> f64 {
    -((-delta).ln_1p() / f64::from(max_partitions_contributed)).exp_m1()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_partition_is_identity() {
        assert_eq!(adjusted_epsilon(0.7, 1), 0.7);
        let d = adjusted_delta(1e-5, 1);
        assert!((d - 1e-5).abs() < 1e-18, "got {}", d);
    }

    #[test]
    fn test_adjusted_delta_composes_back() {
        let d = adjusted_delta(1e-7, 10);
        let recomposed = 1.0 - (1.0 - d).powi(10);
        assert!((recomposed - 1e-7).abs() / 1e-7 < 1e-6);
        // Slightly more than δ/Δ, never less.
        assert!(d >= 1e-8);
    }

    #[test]
    fn test_adjusted_epsilon_splits_evenly() {
        assert!((adjusted_epsilon(0.2, 10) - 0.02).abs() < 1e-15);
    }
}
