use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;
use restock_core::{ProductId, StoreId};
use restock_inventory::{ProductRef, ProductSnapshot, StoreStockRecord};
use restock_rebalance::{OptimizationStrategy, StrategyKind, StrategyPriority, plan_product};

/// Build a snapshot with `stores` records alternating between overstock and
/// understock, so every strategy has real pairing work to do.
fn synthetic_snapshot(stores: usize) -> ProductSnapshot {
    let product = ProductRef {
        id: ProductId::new(),
        name: "Benchmark Widget".to_string(),
        category: "bench".to_string(),
        unit_price_cents: 1_500,
        unit_cost_cents: 700,
    };

    let records = (0..stores)
        .map(|i| {
            let overstocked = i % 2 == 0;
            StoreStockRecord {
                product_id: product.id,
                store_id: StoreId::new(),
                store_name: format!("store-{i}"),
                quantity: if overstocked { 80 + (i as i64 % 17) } else { i as i64 % 9 },
                min_stock: 10,
                max_stock: 40,
                turnover_rate: (i as f64 % 13.0) + 0.5,
                days_of_stock: 12.0,
                last_movement_at: Utc::now(),
            }
        })
        .collect();

    ProductSnapshot::new(product, records)
}

fn bench_planner_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("planner");

    for stores in [10usize, 100, 500] {
        let snapshot = synthetic_snapshot(stores);
        group.throughput(Throughput::Elements(stores as u64));

        for (label, kind) in [
            ("balance", StrategyKind::Balance),
            ("minimize_transfers", StrategyKind::MinimizeTransfers),
            ("maximize_turnover", StrategyKind::MaximizeTurnover),
        ] {
            let strategy = OptimizationStrategy {
                kind,
                priority: StrategyPriority::Balanced,
            };
            group.bench_with_input(
                BenchmarkId::new(label, stores),
                &snapshot,
                |b, snapshot| b.iter(|| plan_product(black_box(snapshot), black_box(&strategy))),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_planner_strategies);
criterion_main!(benches);
