use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use cacheable::{json, CacheBackend, CacheKey, Value};
use cacheable_lru::LruBackend;

fn bench_lru_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_hit");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("fetch_warm_1000", |b| {
        let backend = LruBackend::new(1000);
        let keys: Vec<CacheKey> = (0..100i64)
            .map(|i| CacheKey::list([CacheKey::from("bench"), CacheKey::from(i)]))
            .collect();
        for key in &keys {
            backend.fetch(key, &Value::Null, &mut || Ok(json!(1))).unwrap();
        }

        let mut counter = 0;
        b.iter(|| {
            let key = &keys[counter % keys.len()];
            black_box(backend.fetch(key, &Value::Null, &mut || Ok(json!(1))).unwrap());
            counter += 1;
        });
    });

    group.finish();
}

fn bench_lru_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_churn");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("fetch_evicting_100", |b| {
        let backend = LruBackend::new(100);
        let mut counter: i64 = 0;
        b.iter(|| {
            let key = CacheKey::from(counter);
            black_box(backend.fetch(&key, &Value::Null, &mut || Ok(json!(counter))).unwrap());
            counter += 1;
        });
    });

    group.finish();
}

criterion_group!(benches, bench_lru_hit, bench_lru_churn);
criterion_main!(benches);
