//! Benchmarks for the parse/aggregate/interpolate hot paths
//!
//! Run with: cargo bench --bench series_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write;
use trace_diff::series::{aggregate, TimeSeries};
use trace_diff::trace::{parse_lines, NodeFilter, TraceKind};

const SMALL_LINES: usize = 1_000;
const LARGE_LINES: usize = 100_000;

fn node_state_text(lines: usize) -> String {
    let mut rng = StdRng::seed_from_u64(7);
    let mut text = String::new();
    for i in 0..lines {
        // duplicate roughly every third timestamp to exercise the max policy
        let ts = (i - i % 3) * 1000;
        let value: u32 = rng.gen_range(0..1_000_000);
        let _ = writeln!(text, "{ts} 2 {value}");
    }
    text
}

fn bench_parse_and_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_aggregate_node_state");
    for lines in [SMALL_LINES, LARGE_LINES] {
        let text = node_state_text(lines);
        group.bench_with_input(BenchmarkId::new("max_policy", lines), &text, |b, text| {
            b.iter(|| {
                let records = parse_lines(
                    TraceKind::NodeState,
                    black_box(text),
                    &NodeFilter::node(2),
                );
                aggregate(TraceKind::NodeState, 2, records)
            });
        });
    }
    group.finish();
}

fn bench_interpolation(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpolation");

    let series = TimeSeries::from_samples(
        2,
        (0..LARGE_LINES as u64).map(|i| (i * 1000, (i % 977) as f64)),
    );
    let mut rng = StdRng::seed_from_u64(11);
    let queries: Vec<u64> = (0..1_000)
        .map(|_| rng.gen_range(0..LARGE_LINES as u64 * 1000))
        .collect();

    group.bench_with_input(
        BenchmarkId::new("value_at", queries.len()),
        &queries,
        |b, queries| {
            b.iter(|| {
                let mut acc = 0.0;
                for &t in queries {
                    acc += series.value_at(black_box(t)).unwrap();
                }
                acc
            });
        },
    );
    group.finish();
}

criterion_group!(benches, bench_parse_and_aggregate, bench_interpolation);
criterion_main!(benches);
