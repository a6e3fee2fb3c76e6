use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use partition_select::selector::select_parallel;
use partition_select::{create_partition_strategy, Mechanism, PartitionSelection, PartitionSelector};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn bench_calibration(c: &mut Criterion) {
    let mut group = c.benchmark_group("calibration");
    for m in Mechanism::ALL {
        group.bench_function(m.as_str(), |b| {
            b.iter(|| create_partition_strategy(m.as_str(), black_box(0.2), 1e-7, 10).unwrap())
        });
    }
    group.finish();
}

fn bench_decisions(c: &mut Criterion) {
    let mut group = c.benchmark_group("decision");
    for m in Mechanism::ALL {
        let strategy = create_partition_strategy(m.as_str(), 1.0, 1e-5, 3).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0);

        group.bench_function(BenchmarkId::new("probability_of_keep", m), |b| {
            b.iter(|| strategy.probability_of_keep(black_box(25)))
        });
        group.bench_function(BenchmarkId::new("should_keep", m), |b| {
            b.iter(|| strategy.should_keep(black_box(25), &mut rng))
        });
    }
    group.finish();
}

fn bench_batch_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");

    for &n_partitions in &[10_000usize, 1_000_000] {
        let partitions: Vec<(usize, u64)> =
            (0..n_partitions).map(|i| (i, (i % 97) as u64)).collect();
        let strategy = create_partition_strategy("gaussian", 1.0, 1e-5, 3).unwrap();

        group.bench_with_input(
            BenchmarkId::new("sequential", n_partitions),
            &partitions,
            |b, partitions| {
                b.iter(|| {
                    let mut selector = PartitionSelector::from_seed(strategy.clone(), 7);
                    selector.select(partitions.iter().copied())
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("parallel", n_partitions),
            &partitions,
            |b, partitions| b.iter(|| select_parallel(&strategy, partitions, 7)),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_calibration, bench_decisions, bench_batch_selection);
criterion_main!(benches);
