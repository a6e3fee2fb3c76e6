//! Data-parallel partition selection.
//!
//! Every partition gets its own ChaCha20 stream: the generator is seeded with
//! the batch seed and positioned on stream `i` for the partition at index
//! `i`. Decisions therefore depend only on `(seed, index, num_users)`, never
//! on how rayon splits the work.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use tracing::trace;

use super::{decide, SelectedPartition};
use crate::strategies::{PartitionSelection, PartitionStrategy};

/// Generator used for the partition at `index` in a batch seeded with `seed`.
pub fn partition_rng(seed: u64, index: usize) -> ChaCha20Rng {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    rng.set_stream(index as u64);
    rng
}

/// Select partitions in parallel, returning kept partitions in input order.
///
/// # Arguments
///
/// * `strategy` - Calibrated strategy, shared read-only by all workers
/// * `partitions` - `(key, distinct_users)` pairs
/// * `seed` - Batch seed; the same seed reproduces the same output
pub fn select_parallel<K>(
    strategy: &PartitionStrategy,
    partitions: &[(K, u64)],
    seed: u64,
) -> Vec<SelectedPartition<K>>
where
    K: Clone + Send + Sync,
{
    let kept: Vec<SelectedPartition<K>> = partitions
        .par_iter()
        .enumerate()
        .filter_map(|(index, (key, num_users))| {
            let mut rng = partition_rng(seed, index);
            decide(strategy, *num_users, &mut rng).map(|noised_count| SelectedPartition {
                key: key.clone(),
                num_users: *num_users,
                noised_count,
            })
        })
        .collect();

    trace!(
        mechanism = %strategy.mechanism(),
        considered = partitions.len(),
        kept = kept.len(),
        "selected partition batch in parallel"
    );
    kept
}
