//! Benchmarks for the pure quota engine.
//!
//! The evaluate function runs inside the store's atomic unit on every
//! check, so its cost bounds the per-check work both in-process and
//! server-side.

use adequate_rate_limiter::{evaluate, ActorState, EventTypeConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_evaluate(c: &mut Criterion) {
    let config = EventTypeConfig::new(100, 3600, 300).unwrap();
    let state = ActorState {
        score: 42.5,
        last_updated_at: 1_700_000_000,
        last_blocked_at: 0,
    };

    c.bench_function("evaluate_first_event", |b| {
        b.iter(|| evaluate(black_box(&config), None, black_box(1_700_000_000), 1))
    });

    c.bench_function("evaluate_decay_and_count", |b| {
        b.iter(|| {
            evaluate(
                black_box(&config),
                Some(black_box(&state)),
                black_box(1_700_000_600),
                1,
            )
        })
    });

    c.bench_function("evaluate_peek", |b| {
        b.iter(|| {
            evaluate(
                black_box(&config),
                Some(black_box(&state)),
                black_box(1_700_000_600),
                0,
            )
        })
    });
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
