use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use record_throttle::{KeyExtractor, ThrottleConfig, ThrottleFilter};
use serde_json::json;

/// Benchmark group key extraction speed
fn bench_key_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_extraction");

    let record = json!({
        "kubernetes": {
            "container_name": "api",
            "namespace_name": "production",
            "pod_name": "api-7d9c8f6b4-x2x9q",
        },
        "host": "node-1",
        "message": "GET /healthz 200",
    });

    group.bench_function("single_path", |b| {
        let extractor = KeyExtractor::new(&["kubernetes.container_name"]);
        b.iter(|| extractor.extract(black_box(&record)))
    });

    group.bench_function("composite_key", |b| {
        let extractor = KeyExtractor::new(&[
            "kubernetes.container_name",
            "kubernetes.namespace_name",
            "host",
        ]);
        b.iter(|| extractor.extract(black_box(&record)))
    });

    group.bench_function("missing_fields", |b| {
        let extractor = KeyExtractor::new(&["does.not.exist", "nor.this"]);
        b.iter(|| extractor.extract(black_box(&record)))
    });

    group.finish();
}

/// Benchmark per-record decision throughput for a single hot group
fn bench_single_group_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_group");
    group.throughput(Throughput::Elements(1));

    for limit in [100u64, 100_000] {
        group.bench_with_input(BenchmarkId::new("limit", limit), &limit, |b, &limit| {
            let mut filter = ThrottleFilter::new(ThrottleConfig {
                group_key: vec!["name".to_string()],
                group_bucket_limit: limit,
                ..Default::default()
            })
            .expect("valid config");
            let record = json!({ "name": "api", "message": "hello" });

            b.iter(|| filter.process(black_box(record.clone())))
        });
    }

    group.finish();
}

/// Benchmark throughput with records spread over many groups
fn bench_many_groups(c: &mut Criterion) {
    let mut group = c.benchmark_group("many_groups");
    group.throughput(Throughput::Elements(1));

    for cardinality in [10usize, 1000] {
        group.bench_with_input(
            BenchmarkId::new("cardinality", cardinality),
            &cardinality,
            |b, &cardinality| {
                let mut filter = ThrottleFilter::new(ThrottleConfig {
                    group_key: vec!["name".to_string()],
                    group_bucket_limit: 100_000,
                    ..Default::default()
                })
                .expect("valid config");
                let records: Vec<_> = (0..cardinality)
                    .map(|i| json!({ "name": format!("group-{}", i) }))
                    .collect();

                let mut next = 0;
                b.iter(|| {
                    let record = records[next % cardinality].clone();
                    next += 1;
                    filter.process(black_box(record))
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_key_extraction,
    bench_single_group_throughput,
    bench_many_groups
);
criterion_main!(benches);
