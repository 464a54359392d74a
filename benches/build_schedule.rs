// Run with:  cargo bench --bench build_schedule

use criterion::{criterion_group, criterion_main, Criterion};
use hub75_bitplane::compute_chain_len;
use hub75_bitplane::schedule::Schedule;
use std::hint::black_box;
use std::time::Duration;

fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(100)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

fn build_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_schedule");

    group.bench_function("planes_4", |b| {
        b.iter(|| black_box(Schedule::<4, { compute_chain_len(4) }>::new()));
    });

    group.bench_function("planes_8", |b| {
        b.iter(|| black_box(Schedule::<8, { compute_chain_len(8) }>::new()));
    });

    group.finish();
}

criterion_group!(name = benches; config = configure_criterion(); targets = build_schedule);
criterion_main!(benches);
