//! Partition selection over a stream of partitions.
//!
//! [`PartitionSelector`] pairs a calibrated [`PartitionStrategy`] with an
//! owned random generator, which is the shape an aggregation pipeline wants:
//! feed it `(key, distinct_users)` pairs, get back the partitions that may be
//! released together with their noised counts.
//!
//! For batch work across threads see [`parallel::select_parallel`].

pub mod parallel;

pub use parallel::select_parallel;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::Result;
use crate::strategies::{PartitionSelection, PartitionStrategy};

/// A partition that survived selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectedPartition<K> {
    /// Partition key.
    pub key: K,
    /// True distinct-user count that was fed in.
    pub num_users: u64,
    /// DP-safe count for noise-based strategies, `None` for truncated geometric.
    pub noised_count: Option<f64>,
}

/// Running decision counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionStats {
    /// Partitions a decision was made for.
    pub considered: u64,
    /// Partitions that were kept.
    pub kept: u64,
}

impl SelectionStats {
    /// Fraction of considered partitions that were kept (0 when nothing was considered).
    pub fn keep_rate(&self) -> f64 {
        if self.considered == 0 {
            0.0
        } else {
            self.kept as f64 / self.considered as f64
        }
    }

    fn record(&mut self, kept: bool) {
        self.considered += 1;
        if kept {
            self.kept += 1;
        }
    }
}

/// Strategy plus the random generator that drives it.
///
/// # Example
///
/// ```rust
/// use partition_select::{create_partition_strategy, PartitionSelector};
///
/// let strategy = create_partition_strategy("gaussian", 1.0, 1e-5, 1).unwrap();
/// let mut selector = PartitionSelector::from_seed(strategy, 7);
///
/// let released = selector.select(vec![("rare", 1u64), ("popular", 500)]);
/// assert!(released.iter().all(|p| p.noised_count.is_some()));
/// assert_eq!(selector.stats().considered, 2);
/// ```
#[derive(Clone, Debug)]
pub struct PartitionSelector<R = ChaCha20Rng> {
    strategy: PartitionStrategy,
    rng: R,
    stats: SelectionStats,
}

impl PartitionSelector<ChaCha20Rng> {
    /// Deterministic selector seeded with `seed`.
    pub fn from_seed(strategy: PartitionStrategy, seed: u64) -> Self {
        Self::new(strategy, ChaCha20Rng::seed_from_u64(seed))
    }

    /// Selector seeded from operating-system entropy.
    pub fn from_entropy(strategy: PartitionStrategy) -> Self {
        Self::new(strategy, ChaCha20Rng::from_entropy())
    }
}

impl<R: Rng> PartitionSelector<R> {
    /// Wrap a strategy with a caller-provided generator.
    pub fn new(strategy: PartitionStrategy, rng: R) -> Self {
        Self {
            strategy,
            rng,
            stats: SelectionStats::default(),
        }
    }

    /// The wrapped strategy.
    pub fn strategy(&self) -> &PartitionStrategy {
        &self.strategy
    }

    /// Exact keep probability; does not consume randomness.
    pub fn probability_of_keep(&self, num_users: u64) -> f64 {
        self.strategy.probability_of_keep(num_users)
    }

    /// One keep/drop trial.
    pub fn should_keep(&mut self, num_users: u64) -> bool {
        let kept = self.strategy.should_keep(num_users, &mut self.rng);
        self.stats.record(kept);
        kept
    }

    /// Noised count if the partition is kept.
    ///
    /// # Errors
    ///
    /// Unsupported for truncated geometric; counters are left untouched.
    pub fn noised_value_if_should_keep(&mut self, num_users: u64) -> Result<Option<f64>> {
        let value = self
            .strategy
            .noised_value_if_should_keep(num_users, &mut self.rng)?;
        self.stats.record(value.is_some());
        Ok(value)
    }

    /// Decide every partition and return the kept ones, in input order.
    pub fn select<K, I>(&mut self, partitions: I) -> Vec<SelectedPartition<K>>
    where
        I: IntoIterator<Item = (K, u64)>,
    {
        let before = self.stats;
        let mut kept = Vec::new();
        for (key, num_users) in partitions {
            let decision = decide(&self.strategy, num_users, &mut self.rng);
            self.stats.record(decision.is_some());
            if let Some(noised_count) = decision {
                kept.push(SelectedPartition {
                    key,
                    num_users,
                    noised_count,
                });
            }
        }
        trace!(
            mechanism = %self.strategy.mechanism(),
            considered = self.stats.considered - before.considered,
            kept = self.stats.kept - before.kept,
            "selected partition batch"
        );
        kept
    }

    /// Counters accumulated since construction or the last reset.
    pub fn stats(&self) -> SelectionStats {
        self.stats
    }

    /// Zero the counters.
    pub fn reset_stats(&mut self) {
        self.stats = SelectionStats::default();
    }
}

/// `None` to drop; `Some(noised_count)` to keep.
pub(crate) fn decide<R: Rng + ?Sized>(
    strategy: &PartitionStrategy,
    num_users: u64,
    rng: &mut R,
) -> Option<Option<f64>> {
    match strategy {
        PartitionStrategy::TruncatedGeometric(s) => s.should_keep(num_users, rng).then_some(None),
        PartitionStrategy::Laplace(s) => s.kept_noised_value(num_users, rng).map(Some),
        PartitionStrategy::Gaussian(s) => s.kept_noised_value(num_users, rng).map(Some),
    }
}
