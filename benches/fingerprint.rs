use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::json;

use mallkit::http::pending::{Fingerprint, PendingRegistry};

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    let params = json!({
        "page": 3, "pageSize": 20, "category": "tea",
        "sort": "price", "order": "asc", "minPrice": 10, "maxPrice": 200
    });
    group.bench_function("of_query_params", |b| {
        b.iter(|| {
            criterion::black_box(Fingerprint::of("GET", "/api/products", Some(&params)));
        });
    });

    group.bench_function("of_no_params", |b| {
        b.iter(|| {
            criterion::black_box(Fingerprint::of("GET", "/api/cart", None));
        });
    });

    group.finish();
}

fn bench_registry_churn(c: &mut Criterion) {
    let ns = [100usize, 1_000usize];
    let mut group = c.benchmark_group("pending_registry");

    for &n in &ns {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("register_distinct", n), &n, |b, &n| {
            let mut rng = StdRng::seed_from_u64(0xCAFE);
            let fps: Vec<Fingerprint> = (0..n)
                .map(|_| Fingerprint::raw(format!("GET:/api/p/{}", rng.gen::<u64>())))
                .collect();
            b.iter(|| {
                let reg = PendingRegistry::new();
                let mut guards = Vec::with_capacity(n);
                for fp in &fps {
                    guards.push(reg.register(fp));
                }
                criterion::black_box(reg.len());
            });
        });

        group.bench_with_input(BenchmarkId::new("register_superseding", n), &n, |b, &n| {
            let fp = Fingerprint::raw("GET:/api/cart");
            b.iter(|| {
                let reg = PendingRegistry::new();
                for _ in 0..n {
                    let _ = criterion::black_box(reg.register(&fp));
                }
                criterion::black_box(reg.len());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fingerprint, bench_registry_churn);
criterion_main!(benches);
