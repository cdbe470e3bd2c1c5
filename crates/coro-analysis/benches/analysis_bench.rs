//! Criterion benchmarks for coro-analysis
//!
//! Run with: cargo bench -p coro-analysis

#![allow(missing_docs)]

use coro_analysis::{PitchConfig, PitchEstimator, align};
use coro_core::RingBuffer;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::f32::consts::PI;

const SAMPLE_RATE: f32 = 48000.0;

fn generate_sine(size: usize, frequency: f32) -> Vec<f32> {
    (0..size)
        .map(|i| (2.0 * PI * frequency * i as f32 / SAMPLE_RATE).sin())
        .collect()
}

fn bench_pitch_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pitch_Estimate");

    for max_period in [300usize, 600, 1000] {
        let config = PitchConfig {
            max_period,
            ..PitchConfig::default()
        };
        let mut estimator = PitchEstimator::new(config);
        let frame = generate_sine(estimator.frame_len(), 220.0);

        group.bench_with_input(BenchmarkId::from_parameter(max_period), &frame, |b, frame| {
            b.iter(|| estimator.estimate(black_box(frame)))
        });
    }

    group.finish();
}

fn bench_pitch_from_ring(c: &mut Criterion) {
    let mut ring = RingBuffer::new(4096);
    for s in generate_sine(4096, 330.0) {
        ring.write(s);
    }
    let mut estimator = PitchEstimator::new(PitchConfig::default());
    let start = ring.write_pos().wrapping_sub(estimator.frame_len()) & ring.mask();

    c.bench_function("Pitch_Estimate_Ring", |b| {
        b.iter(|| estimator.estimate_ring(black_box(&ring), start))
    });
}

fn bench_align(c: &mut Criterion) {
    let source = generate_sine(8192, 440.0);
    let delayed: Vec<f32> = std::iter::repeat_n(0.0, 512).chain(source.iter().copied()).collect();

    c.bench_function("Align_1024_lags", |b| {
        b.iter(|| align(black_box(&source), black_box(&delayed), 1024, 2048))
    });
}

criterion_group!(benches, bench_pitch_estimate, bench_pitch_from_ring, bench_align);
criterion_main!(benches);
