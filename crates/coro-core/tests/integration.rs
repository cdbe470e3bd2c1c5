//! Integration tests for coro-core DSP primitives.
//!
//! Exercises the ring buffer as the grain synthesizer uses it: fractional
//! reads of a band-limited signal, reads across the wrap seam, and windows
//! copied out for analysis.

use coro_core::{RingBuffer, SmoothedParam, cubic_interp, pan_gains, semitones_to_ratio};

const TAU: f32 = core::f32::consts::TAU;

fn fill_sine(ring: &mut RingBuffer, period: f32, count: usize) {
    for n in 0..count {
        ring.write(libm::sinf(TAU * n as f32 / period));
    }
}

#[test]
fn fractional_reads_track_a_slow_sine() {
    let mut ring = RingBuffer::new(1024);
    let period = 64.0;
    fill_sine(&mut ring, period, 1024);

    // read_cubic(pos) interpolates one sample after pos
    for step in 0..400 {
        let pos = 100.0 + step as f32 * 0.37;
        let expected = libm::sinf(TAU * (pos + 1.0) / period);
        let got = ring.read_cubic(pos);
        assert!(
            (got - expected).abs() < 2e-3,
            "pos {pos}: expected {expected}, got {got}"
        );
    }
}

#[test]
fn reads_across_the_seam_are_continuous() {
    let mut ring = RingBuffer::new(256);
    let period = 50.0;
    // Write more than one lap so the seam sits mid-signal
    fill_sine(&mut ring, period, 256 + 100);

    let mut previous = ring.read_cubic(250.0);
    for step in 1..80 {
        let pos = ring.wrap_pos(250.0 + step as f32 * 0.1);
        let value = ring.read_cubic(pos);
        assert!(
            (value - previous).abs() < 0.05,
            "jump at {pos}: {previous} -> {value}"
        );
        previous = value;
    }
}

#[test]
fn analysis_window_matches_history() {
    let mut ring = RingBuffer::new(512);
    for n in 0..700 {
        ring.write(n as f32);
    }
    // The 200 most recent samples end just before the write cursor
    let start = ring.write_pos().wrapping_sub(200) & ring.mask();
    let mut window = vec![0.0; 200];
    ring.copy_window(start, &mut window);
    assert_eq!(window[0], 500.0);
    assert_eq!(window[199], 699.0);
}

#[test]
fn ratio_smoothing_reaches_a_fifth() {
    let fifth = semitones_to_ratio(7.0);
    let mut ratio = SmoothedParam::with_coeff(1.0, 0.2);
    ratio.set_target(fifth);

    let mut previous = ratio.get();
    for _ in 0..80 {
        let next = ratio.advance();
        assert!(next >= previous, "smoothing must be monotonic");
        previous = next;
    }
    assert!((ratio.get() - fifth).abs() < 1e-5);
}

#[test]
fn window_table_interpolation_is_smooth() {
    // Hann table with three zero shoulders on each side, read the way grains read it
    let size = 64;
    let mut table = vec![0.0f32; size + 6];
    for k in 0..size {
        table[3 + k] = 0.5 * (1.0 - libm::cosf(TAU * k as f32 / size as f32));
    }
    for step in 0..=100 {
        let progress = step as f32 / 100.0;
        let index = 2.0 + size as f32 * progress;
        let base = index as usize;
        let w = cubic_interp(&table[base..base + 4], index - base as f32);
        let ideal = 0.5 * (1.0 - libm::cosf(TAU * progress));
        assert!((w - ideal).abs() < 0.01, "progress {progress}: {w} vs {ideal}");
    }
}

#[test]
fn pan_law_is_complementary() {
    for step in -10..=10 {
        let pan = step as f32 / 10.0;
        let (l, r) = pan_gains(pan);
        assert!((l + r - 1.0).abs() < 1e-6);
        assert!(l >= 0.0 && r >= 0.0);
    }
}
