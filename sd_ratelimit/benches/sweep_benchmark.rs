use std::hint::black_box;
use std::time::Duration;

use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use sd_ratelimit::DispatchFuture;
use sd_ratelimit::Dispatcher;
use sd_ratelimit::SlidingWindow;

struct NoopDispatcher;

impl Dispatcher for NoopDispatcher {
    type Payload = u64;
    type Response = u64;
    type Error = std::io::Error;

    fn dispatch<'a>(&'a self, payload: u64, _signature: &'a str) -> DispatchFuture<'a, u64, std::io::Error> {
        Box::pin(async move { Ok(payload) })
    }
}

fn bench_occupancy_sweep(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    // Pre-fill a wide window so the sweep scans a full ledger every call
    let limiter = SlidingWindow::new(10_000, Duration::from_secs(600)).unwrap();
    rt.block_on(async {
        for id in 0..10_000u64 {
            limiter.admit(&NoopDispatcher, id, "sig").await.unwrap();
        }
    });

    c.bench_function("occupancy sweep 10k entries", |b| b.iter(|| black_box(limiter.occupancy())));
}

fn bench_uncontended_admit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    // Tiny window keeps the ledger near-empty, measuring the gate + sweep +
    // bookkeeping overhead of an admission that never paces
    let limiter = SlidingWindow::new(1_000_000, Duration::from_millis(1)).unwrap();

    c.bench_function("uncontended admit", |b| {
        b.iter(|| rt.block_on(limiter.admit(&NoopDispatcher, black_box(7u64), black_box("sig"))).unwrap())
    });
}

criterion_group!(benches, bench_occupancy_sweep, bench_uncontended_admit);
criterion_main!(benches);
