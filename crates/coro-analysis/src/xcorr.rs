//! Cross-correlation and lag alignment.
//!
//! Used to compare a processed signal against its source: a unity-ratio
//! harmonizer output should be a delayed, scaled copy of its input, and
//! [`align`] recovers the delay together with a correlation score.

use crate::fft::Fft;
use rustfft::num_complex::Complex;

/// Best lag between two signals and the normalized correlation at that lag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    /// Samples by which the second signal trails the first
    pub lag: usize,
    /// Pearson-style correlation in `[-1, 1]` at `lag`
    pub correlation: f32,
}

/// Full linear cross-correlation via FFT.
///
/// Output length is `a.len() + b.len() - 1`; index `b.len() - 1` is lag zero
/// and higher indices are positive lags (`b` delayed relative to `a`).
pub fn xcorr_fft(a: &[f32], b: &[f32]) -> Vec<f32> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let output_len = a.len() + b.len() - 1;
    let fft = Fft::new(output_len.next_power_of_two());
    let n = fft.size();

    let mut fa: Vec<Complex<f32>> = (0..n)
        .map(|i| Complex::new(a.get(i).copied().unwrap_or(0.0), 0.0))
        .collect();
    let mut fb: Vec<Complex<f32>> = (0..n)
        .map(|i| Complex::new(b.get(i).copied().unwrap_or(0.0), 0.0))
        .collect();

    fft.forward_complex(&mut fa);
    fft.forward_complex(&mut fb);
    for (x, y) in fa.iter_mut().zip(fb.iter()) {
        *x = x.conj() * *y;
    }
    fft.inverse_complex(&mut fa);

    // Negative lags wrap to the top of the circular result
    let negative = b.len() - 1;
    (0..output_len)
        .map(|i| {
            let idx = if i < negative { n - negative + i } else { i - negative };
            fa[idx].re
        })
        .collect()
}

/// Lag and value of the largest-magnitude entry of a [`xcorr_fft`] result.
///
/// `max_lag` limits the search to `-max_lag..=max_lag`.
pub fn peak_lag(corr: &[f32], b_len: usize, max_lag: usize) -> (i32, f32) {
    let zero = b_len.saturating_sub(1);
    let lo = zero.saturating_sub(max_lag);
    let hi = (zero + max_lag).min(corr.len().saturating_sub(1));

    let mut best = (0i32, 0.0f32);
    for (i, &value) in corr.iter().enumerate().take(hi + 1).skip(lo) {
        if value.abs() > best.1.abs() {
            best = (i as i32 - zero as i32, value);
        }
    }
    best
}

/// Normalized correlation of two equal-length slices.
///
/// Returns zero when either slice has no energy.
pub fn correlation(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    let (mut ab, mut aa, mut bb) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a[..n].iter().zip(b[..n].iter()) {
        ab += x as f64 * y as f64;
        aa += x as f64 * x as f64;
        bb += y as f64 * y as f64;
    }
    let denom = (aa * bb).sqrt();
    if denom > 1e-20 { (ab / denom) as f32 } else { 0.0 }
}

/// Finds how far `delayed` trails `reference`.
///
/// Compares `reference[..window]` against `delayed[lag..lag + window]` for
/// every lag in `0..=max_lag` and keeps the lag with the highest correlation.
/// `window` is shortened to fit both signals.
pub fn align(reference: &[f32], delayed: &[f32], max_lag: usize, window: usize) -> Alignment {
    let window = window.min(reference.len());
    let mut best = Alignment {
        lag: 0,
        correlation: 0.0,
    };

    for lag in 0..=max_lag {
        if lag + window > delayed.len() {
            break;
        }
        let score = correlation(&reference[..window], &delayed[lag..lag + window]);
        if score > best.correlation {
            best = Alignment {
                lag,
                correlation: score,
            };
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn white_noise(len: usize, seed: u32) -> Vec<f32> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as i32 as f32) / (i32::MAX as f32)
            })
            .collect()
    }

    #[test]
    fn test_xcorr_finds_delay() {
        let a = white_noise(512, 0x1234_5678);
        let delay = 37;
        let mut b = vec![0.0; delay];
        b.extend_from_slice(&a[..512 - delay]);

        let corr = xcorr_fft(&a, &b);
        assert_eq!(corr.len(), 1023);
        let (lag, _) = peak_lag(&corr, b.len(), 100);
        assert_eq!(lag, delay as i32);
    }

    #[test]
    fn test_correlation_bounds() {
        let a: Vec<f32> = (0..256).map(|i| (2.0 * PI * i as f32 / 32.0).sin()).collect();
        let neg: Vec<f32> = a.iter().map(|x| -0.5 * x).collect();
        assert!((correlation(&a, &a) - 1.0).abs() < 1e-5);
        assert!((correlation(&a, &neg) + 1.0).abs() < 1e-5);
        assert_eq!(correlation(&a, &[0.0; 256]), 0.0);
    }

    #[test]
    fn test_align_scaled_delayed_copy() {
        let reference = white_noise(4000, 0xBEEF);
        let mut delayed = vec![0.0; 250];
        delayed.extend(reference.iter().map(|x| 0.3 * x));

        let alignment = align(&reference, &delayed, 600, 2048);
        assert_eq!(alignment.lag, 250);
        assert!(alignment.correlation > 0.999);
    }

    #[test]
    fn test_align_empty() {
        let alignment = align(&[], &[], 10, 100);
        assert_eq!(alignment.lag, 0);
        assert_eq!(alignment.correlation, 0.0);
    }
}
