use std::thread;

use bytes::Bytes;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use memstore_storage::{SetOptions, Store, StoreConfig};

fn manual_store() -> Store {
    Store::with_config(StoreConfig::default().with_auto_start(false)).unwrap()
}

fn bench_set_get_sequential(c: &mut Criterion) {
    c.bench_function("set_get_sequential_10k", |b| {
        b.iter(|| {
            let store = manual_store();
            let opts = SetOptions::default();
            for i in 0..10_000 {
                let key = format!("key:{i}");
                let value = Bytes::from(format!("value:{i}"));
                store.set(key.as_str(), value, &opts);
                black_box(store.get(key.as_str()));
            }
        })
    });
}

fn bench_set_concurrent(c: &mut Criterion) {
    c.bench_function("set_concurrent_4_threads_10k", |b| {
        b.iter(|| {
            let store = manual_store();
            thread::scope(|s| {
                for t in 0..4 {
                    let store = store.clone();
                    s.spawn(move || {
                        let opts = SetOptions::default();
                        for i in 0..2_500 {
                            store.set(format!("key:{t}:{i}"), Bytes::from_static(b"v"), &opts);
                        }
                    });
                }
            });
            black_box(store.size());
        })
    });
}

fn bench_handle_resolution(c: &mut Criterion) {
    c.bench_function("handle_get_10k", |b| {
        let store = manual_store();
        let handle = store.create_handle("session:current");
        store.set(&handle, Bytes::from_static(b"v"), &SetOptions::default());
        b.iter(|| {
            for _ in 0..10_000 {
                black_box(store.get(&handle));
            }
        })
    });
}

fn bench_purge_expired(c: &mut Criterion) {
    c.bench_function("purge_10k_expired", |b| {
        b.iter(|| {
            let store = manual_store();
            let opts = SetOptions::expiring(1);
            for i in 0..10_000 {
                store.set(format!("key:{i}"), Bytes::from_static(b"v"), &opts);
            }
            thread::sleep(std::time::Duration::from_millis(2));
            black_box(store.purge_expired());
        })
    });
}

criterion_group!(
    benches,
    bench_set_get_sequential,
    bench_set_concurrent,
    bench_handle_resolution,
    bench_purge_expired,
);
criterion_main!(benches);
