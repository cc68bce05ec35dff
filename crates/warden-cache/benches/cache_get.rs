use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use warden_cache::{CacheStore, LoadError};

fn echo_loader(key: &String) -> Result<String, LoadError> {
    Ok(key.clone())
}

fn bench_hit(c: &mut Criterion) {
    let cache: CacheStore = CacheStore::with_capacity(100, echo_loader).unwrap();
    for i in 0..100 {
        cache.get(&format!("k{}", i)).unwrap();
    }

    c.bench_function("get_hit", |b| {
        b.iter(|| cache.get(black_box("k42")).unwrap())
    });
}

fn bench_churn(c: &mut Criterion) {
    let cache: CacheStore = CacheStore::with_capacity(100, echo_loader).unwrap();
    let keys: Vec<String> = (0..1000).map(|i| format!("k{}", i)).collect();
    let mut i = 0usize;

    c.bench_function("get_miss_evict", |b| {
        b.iter(|| {
            i = (i + 1) % keys.len();
            cache.get(black_box(keys[i].as_str())).unwrap()
        })
    });
}

fn bench_contended_hits(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_hits");
    for threads in [2usize, 4, 8] {
        let cache: Arc<CacheStore> =
            Arc::new(CacheStore::with_capacity(100, echo_loader).unwrap());
        for i in 0..100 {
            cache.get(&format!("k{}", i)).unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &n| {
            b.iter(|| {
                let handles: Vec<_> = (0..n)
                    .map(|t| {
                        let cache = Arc::clone(&cache);
                        thread::spawn(move || {
                            for i in 0..256 {
                                let key = format!("k{}", (i + t) % 100);
                                black_box(cache.get(key.as_str()).unwrap());
                            }
                        })
                    })
                    .collect();
                for h in handles {
                    h.join().unwrap();
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hit, bench_churn, bench_contended_hits);
criterion_main!(benches);
