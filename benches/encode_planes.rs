// Run with:  cargo bench --bench encode_planes

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use hub75_bitplane::config::Config;
use hub75_bitplane::handoff::FrameHandoff;
use hub75_bitplane::pixel::RgbImage;
use hub75_bitplane::plane::Backbuffer;
use std::hint::black_box;
use std::time::Duration;

const ROWS: usize = 32;
const COLS: usize = 64;
const PLANES: usize = 4;
const NROWS: usize = hub75_bitplane::compute_rows(ROWS);
const IMAGE_LEN: usize = hub75_bitplane::compute_image_len(COLS, ROWS);

// Number of iterations to target ~1-5ms per measurement
const ITERATIONS: usize = 10;

fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(100)
        .measurement_time(Duration::from_secs(10)) // Longer measurement time
        .warm_up_time(Duration::from_secs(3))
        .confidence_level(0.95)
        .significance_level(0.05)
}

fn gradient() -> Vec<u8> {
    let mut image = vec![0u8; IMAGE_LEN];
    for (i, byte) in image.iter_mut().enumerate() {
        *byte = (i % 256) as u8;
    }
    image
}

fn encode_planes(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_planes");
    group.throughput(Throughput::Elements((NROWS * COLS * PLANES * ITERATIONS) as u64));

    let image = gradient();
    let config = Config::<COLS>::new();

    group.bench_function("rgb_image", |b| {
        let source = RgbImage::<COLS>::new(&image);
        let mut buffer = Backbuffer::<COLS, NROWS, PLANES>::new();

        b.iter(|| {
            for _ in 0..ITERATIONS {
                black_box(&mut buffer).encode(&config, black_box(&source));
            }
        });
    });

    // per-pixel locking through the handoff
    group.bench_function("frame_handoff", |b| {
        let handoff = FrameHandoff::<COLS>::new();
        handoff.install(&image);
        let mut buffer = Backbuffer::<COLS, NROWS, PLANES>::new();

        b.iter(|| {
            for _ in 0..ITERATIONS {
                black_box(&mut buffer).encode(&config, black_box(&handoff));
            }
        });
    });

    group.finish();
}

criterion_group!(name = benches; config = configure_criterion(); targets = encode_planes);
criterion_main!(benches);
