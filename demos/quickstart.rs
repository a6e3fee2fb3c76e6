//! Quickstart: release only the categories that are safe to reveal

use partition_select::{create_partition_strategy, PartitionSelection, PartitionSelector};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Partition Selection Quickstart\n");

    // Each user may appear in up to 3 categories.
    let strategy = create_partition_strategy("laplace", 1.0, 1e-5, 3).unwrap();
    println!(
        "Laplace strategy: epsilon={}, delta={}, threshold={:.2}\n",
        strategy.epsilon(),
        strategy.delta(),
        strategy.threshold().unwrap()
    );

    // Distinct users per category, as computed by the aggregation pipeline.
    let categories = vec![
        ("rare-disease", 1u64),
        ("niche-hobby", 12),
        ("cycling", 48),
        ("running", 310),
        ("walking", 2_400),
    ];

    let mut selector = PartitionSelector::from_entropy(strategy);
    let released = selector.select(categories.clone());

    for (name, users) in &categories {
        let p = selector.probability_of_keep(*users);
        match released.iter().find(|r| r.key == *name) {
            Some(r) => println!(
                "{:<14} users={:<6} p(keep)={:.4}  RELEASED as {:.1}",
                name,
                users,
                p,
                r.noised_count.unwrap_or_default()
            ),
            None => println!("{:<14} users={:<6} p(keep)={:.4}  suppressed", name, users, p),
        }
    }

    let stats = selector.stats();
    println!(
        "\nReleased {} of {} categories; the noised counts are DP-safe and need no extra budget.",
        stats.kept, stats.considered
    );
}
