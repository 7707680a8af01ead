//! Aggregator benchmarks
//!
//! Measures accumulation throughput for each aggregate kind over integer
//! and float columns, with and without NULLs.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kestrel_common::testing::fixtures;
use kestrel_common::types::Value;
use kestrel_query::{AggregateKind, Aggregator};

const KINDS: [AggregateKind; 5] = [
    AggregateKind::Sum,
    AggregateKind::Max,
    AggregateKind::Min,
    AggregateKind::Avg,
    AggregateKind::Count,
];

/// Every `null_every`-th value is NULL; 0 disables NULLs
fn int_column(count: usize, null_every: usize) -> Vec<Value> {
    let raw: Vec<Option<i32>> = (0..count)
        .map(|i| {
            if null_every > 0 && i % null_every == 0 {
                None
            } else {
                Some((i % 1000) as i32)
            }
        })
        .collect();
    fixtures::ints(&raw)
}

fn float_column(count: usize) -> Vec<Value> {
    let raw: Vec<Option<f32>> = (0..count).map(|i| Some(i as f32 * 0.5)).collect();
    fixtures::floats(&raw)
}

fn aggregate(kind: AggregateKind, values: &[Value]) -> Value {
    let mut agg = Aggregator::new(kind);
    for v in values {
        agg.accumulate(v).unwrap();
    }
    agg.evaluate().unwrap()
}

fn int_aggregates(c: &mut Criterion) {
    let mut group = c.benchmark_group("int_aggregates");

    for row_count in [1_000, 100_000] {
        let values = int_column(row_count, 0);
        for kind in KINDS {
            group.bench_with_input(BenchmarkId::new(kind.to_string(), row_count), &values, |b, values| {
                b.iter(|| criterion::black_box(aggregate(kind, values)))
            });
        }
    }

    group.finish();
}

fn nullable_aggregates(c: &mut Criterion) {
    let mut group = c.benchmark_group("nullable_aggregates");
    let values = int_column(100_000, 4);

    for kind in KINDS {
        group.bench_with_input(BenchmarkId::new(kind.to_string(), "25%_null"), &values, |b, values| {
            b.iter(|| criterion::black_box(aggregate(kind, values)))
        });
    }

    group.finish();
}

fn float_aggregates(c: &mut Criterion) {
    let mut group = c.benchmark_group("float_aggregates");
    let values = float_column(100_000);

    for kind in [AggregateKind::Sum, AggregateKind::Avg] {
        group.bench_with_input(BenchmarkId::new(kind.to_string(), 100_000), &values, |b, values| {
            b.iter(|| criterion::black_box(aggregate(kind, values)))
        });
    }

    group.finish();
}

criterion_group!(benches, int_aggregates, nullable_aggregates, float_aggregates);
criterion_main!(benches);
