//! Mathematical utility functions for DSP.
//!
//! Small, allocation-free helpers shared by the pitch tracker, the grain
//! synthesizer and the host crates. All functions are `no_std` friendly.
//!
//! # Pitch Conversions
//!
//! - [`semitones_to_ratio`] / [`ratio_to_semitones`] - Equal-tempered interval math
//! - [`freq_to_midi`] - Fractional MIDI note of a frequency, A4 = 440 Hz
//!
//! # Level Conversions
//!
//! - [`linear_to_db`] - Linear gain in decibels
//! - [`pan_gains`] - Linear pan law used by the grain mixer
//!
//! # Numeric Hygiene
//!
//! | Function | Replaces with zero |
//! |----------|--------------------|
//! | [`flush_denormal`] | magnitudes below 1e-20 |
//! | [`scrub`] | NaN, infinities, magnitudes outside 1e-15..1e15 |

use libm::{exp2f, log2f, logf};

/// Reference pitch for MIDI note 69 (A4).
const A4_HZ: f32 = 440.0;

/// Convert linear gain to decibels.
///
/// Inputs at or below zero are floored to -200 dB instead of producing `-inf`.
///
/// # Example
/// ```rust
/// use coro_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Frequency ratio of an equal-tempered interval.
///
/// # Example
/// ```rust
/// use coro_core::semitones_to_ratio;
///
/// assert_eq!(semitones_to_ratio(12.0), 2.0);
/// assert!((semitones_to_ratio(7.0) - 1.4983).abs() < 1e-4);
/// ```
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    exp2f(semitones / 12.0)
}

/// Equal-tempered interval, in semitones, of a frequency ratio.
#[inline]
pub fn ratio_to_semitones(ratio: f32) -> f32 {
    12.0 * log2f(ratio)
}

/// Fractional MIDI note of a frequency in Hz.
///
/// # Example
/// ```rust
/// use coro_core::freq_to_midi;
///
/// assert!((freq_to_midi(440.0) - 69.0).abs() < 1e-4);
/// assert!((freq_to_midi(220.0) - 57.0).abs() < 1e-4);
/// ```
#[inline]
pub fn freq_to_midi(freq: f32) -> f32 {
    69.0 + 12.0 * log2f(freq / A4_HZ)
}

/// Left/right gains for a pan position in `[-1, 1]`.
///
/// `+1` is hard left, `-1` is hard right; the two gains always sum to one.
#[inline]
pub fn pan_gains(pan: f32) -> (f32, f32) {
    ((pan + 1.0) * 0.5, (1.0 - pan) * 0.5)
}

/// Four-point cubic interpolation between `points[1]` and `points[2]`.
///
/// `t` is the fractional position in `[0, 1)` past `points[1]`. The kernel is
/// a blend of linear interpolation and a symmetric curvature correction, so
/// it passes exactly through the two middle points.
///
/// # Panics
///
/// Panics if `points` has fewer than four samples.
#[inline]
pub fn cubic_interp(points: &[f32], t: f32) -> f32 {
    let b = 1.0 - t;
    let c = t * b;
    (1.0 + 1.5 * c) * (points[1] * b + points[2] * t)
        - 0.5 * c * (points[0] * b + points[1] + points[2] + points[3] * t)
}

/// Flush denormal (subnormal) floats to zero.
///
/// Replaces values below 1e-20 with zero, well before the IEEE 754 subnormal
/// range begins. Use it on state that decays toward zero.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Replace any non-finite or absurd magnitude with zero.
///
/// Keeps values whose magnitude lies strictly between 1e-15 and 1e15. NaN
/// fails both comparisons and is therefore dropped too.
///
/// # Example
/// ```rust
/// use coro_core::scrub;
///
/// assert_eq!(scrub(0.25), 0.25);
/// assert_eq!(scrub(f32::NAN), 0.0);
/// assert_eq!(scrub(f32::INFINITY), 0.0);
/// assert_eq!(scrub(1e-30), 0.0);
/// ```
#[inline]
pub fn scrub(x: f32) -> f32 {
    let magnitude = x.abs();
    if magnitude > 1e-15 && magnitude < 1e15 {
        x
    } else {
        0.0
    }
}
