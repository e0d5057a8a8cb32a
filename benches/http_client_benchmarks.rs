//! Option resolution benchmarks for fetchkit

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::time::Duration;

use fetchkit::{append_query, merge_headers, resolve, resolve_base_url, FetchOptions};

fn query_composition_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_composition");

    let small = vec![("id".to_string(), "1".to_string())];
    let large: Vec<(String, String)> = (0..32)
        .map(|i| (format!("key{i}"), format!("value{i}")))
        .collect();

    group.bench_function("append_single_pair", |b| {
        b.iter(|| black_box(append_query(black_box("/users"), &small)));
    });

    group.bench_function("append_32_pairs", |b| {
        b.iter(|| black_box(append_query(black_box("/search?"), &large)));
    });

    group.bench_function("append_empty", |b| {
        b.iter(|| black_box(append_query(black_box("/users"), &[])));
    });

    group.finish();
}

fn header_merge_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("header_merge");

    let defaults = vec![
        ("Accept".to_string(), "application/json".to_string()),
        ("User-Agent".to_string(), "fetchkit".to_string()),
        ("X-Client".to_string(), "bench".to_string()),
    ];
    let overrides = vec![("accept".to_string(), "text/plain".to_string())];

    group.bench_function("merge_with_override", |b| {
        b.iter(|| black_box(merge_headers(&defaults, &overrides)));
    });

    group.finish();
}

fn resolution_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    group.bench_function("resolve_base_url", |b| {
        b.iter(|| {
            black_box(resolve_base_url(
                black_box("https://api.example.com/v1/"),
                black_box("users?id=1"),
            ))
        });
    });

    let defaults = FetchOptions::builder()
        .base_url("https://api.example.com")
        .header("Accept", "application/json")
        .timeout(Duration::from_secs(5))
        .build();

    group.bench_function("resolve_full_config", |b| {
        b.iter(|| {
            let call = FetchOptions::builder()
                .header("X-Trace", "abc")
                .query("id", 1)
                .build();
            black_box(resolve(&defaults, call, "/users"))
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    query_composition_benchmark,
    header_merge_benchmark,
    resolution_benchmark,
);

criterion_main!(benches);
