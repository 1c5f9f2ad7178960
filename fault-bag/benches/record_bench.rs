use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;

use fault_bag::Bucket;

fn bench_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("record");

    // Capacity large enough that the failure path never saturates.
    let bag = Arc::new(Bucket::new(usize::MAX, Duration::from_secs(5), Duration::from_secs(1)).unwrap());

    group.bench_function("success", |b| {
        let bag = Arc::clone(&bag);
        b.iter(|| black_box(bag.record(false)))
    });

    group.bench_function("failure", |b| {
        let bag = Arc::clone(&bag);
        b.iter(|| black_box(bag.record(true)))
    });

    group.bench_function("contended-4-threads", |b| {
        b.iter_custom(|iters| {
            let bag = Arc::new(
                Bucket::new(usize::MAX, Duration::from_secs(5), Duration::from_secs(1)).unwrap(),
            );
            let threads = 4;
            let barrier = Arc::new(Barrier::new(threads + 1));

            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    let bag = Arc::clone(&bag);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        for i in 0..iters {
                            let _ = black_box(bag.record(i % 2 == 0));
                        }
                    })
                })
                .collect();

            barrier.wait();
            let start = Instant::now();
            for handle in handles {
                let _ = handle.join();
            }
            start.elapsed()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_record);
criterion_main!(benches);
