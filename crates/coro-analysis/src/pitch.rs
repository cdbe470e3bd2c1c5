//! Period estimation by cumulative mean normalized difference (CMNDF).
//!
//! The estimator looks at a frame of `2 * max_period` samples and compares the
//! first half against every lag of the whole frame:
//!
//! ```text
//! d(k)  = sum over n < M of (x[n] - x[n + k])^2
//!       = E0 + Ek - 2 r(k)
//! d'(k) = d(k) * k / sum over j in 1..=k of d(j)
//! ```
//!
//! `r(k)` comes from one FFT cross-correlation, `E0` is `r(0)` and `Ek` is a
//! running window energy. The first local minimum of `d'` below the threshold,
//! past the minimum lag, is refined with a parabola through its neighbours.
//!
//! Raw estimates pass through a [`MedianFilter`] so a single octave error
//! never reaches the synthesis side.
//!
//! All buffers are sized in [`PitchEstimator::new`]; [`PitchEstimator::estimate`]
//! does not allocate.

use coro_core::RingBuffer;
use rustfft::num_complex::Complex;

use crate::fft::Fft;

/// Tuning of a [`PitchEstimator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchConfig {
    /// Longest detectable period in samples (`M`)
    pub max_period: usize,
    /// Lags at or below this are never reported
    pub min_lag: usize,
    /// Acceptance threshold on the normalized difference
    pub threshold: f32,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            max_period: 600,
            min_lag: 20,
            threshold: 0.2,
        }
    }
}

/// Result of one analysis frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Unfiltered period in samples, `0.0` when nothing was accepted
    pub raw: f32,
    /// Median of the recent raw periods
    pub period: f32,
    /// `true` when this frame produced an estimate
    pub voiced: bool,
}

impl PitchEstimate {
    /// Fundamental frequency of the filtered period, if it is positive.
    pub fn frequency(&self, sample_rate: f32) -> Option<f32> {
        (self.period > 0.0).then(|| sample_rate / self.period)
    }
}

/// Running median over the last `N` values.
///
/// `N` should be odd so the median is a member of the history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MedianFilter<const N: usize> {
    history: [f32; N],
    next: usize,
}

impl<const N: usize> MedianFilter<N> {
    /// Creates a filter whose history is all `initial`.
    pub fn new(initial: f32) -> Self {
        Self {
            history: [initial; N],
            next: 0,
        }
    }

    /// Replaces the oldest entry and returns the new median.
    pub fn push(&mut self, value: f32) -> f32 {
        self.history[self.next] = value;
        self.next = (self.next + 1) % N;
        self.median()
    }

    /// Median of the current history.
    pub fn median(&self) -> f32 {
        let mut sorted = self.history;
        sorted.sort_unstable_by(f32::total_cmp);
        sorted[N / 2]
    }

    /// Refills the history with `value`.
    pub fn fill(&mut self, value: f32) {
        self.history = [value; N];
        self.next = 0;
    }
}

/// Number of raw estimates the median runs over.
pub const PITCH_HISTORY: usize = 3;

/// CMNDF period estimator with a median post-filter.
///
/// # Example
///
/// ```rust
/// use coro_analysis::{PitchConfig, PitchEstimator};
///
/// let mut estimator = PitchEstimator::new(PitchConfig::default());
/// let frame: Vec<f32> = (0..estimator.frame_len())
///     .map(|n| (std::f32::consts::TAU * n as f32 / 200.0).sin())
///     .collect();
///
/// estimator.estimate(&frame);
/// estimator.estimate(&frame);
/// let estimate = estimator.estimate(&frame);
/// assert!(estimate.voiced);
/// assert!((estimate.period - 200.0).abs() < 1.0);
/// ```
#[derive(Debug)]
pub struct PitchEstimator {
    config: PitchConfig,
    fft: Fft,
    scratch: Vec<Complex<f32>>,
    /// First half of the frame, zero padded; becomes the correlation
    lead: Vec<Complex<f32>>,
    /// Whole frame, zero padded
    span: Vec<Complex<f32>>,
    frame: Vec<f32>,
    history: MedianFilter<PITCH_HISTORY>,
}

impl PitchEstimator {
    /// Creates an estimator and allocates all of its working storage.
    ///
    /// The FFT length is the next power of two at or above `2 * max_period`.
    pub fn new(config: PitchConfig) -> Self {
        let frame_len = 2 * config.max_period.max(1);
        let fft = Fft::new(frame_len.next_power_of_two());
        let zero = Complex::new(0.0, 0.0);
        Self {
            scratch: vec![zero; fft.scratch_len()],
            lead: vec![zero; fft.size()],
            span: vec![zero; fft.size()],
            frame: vec![0.0; frame_len],
            history: MedianFilter::new(0.0),
            fft,
            config,
        }
    }

    /// Analysis parameters.
    pub fn config(&self) -> &PitchConfig {
        &self.config
    }

    /// Samples consumed per frame (`2 * max_period`).
    pub fn frame_len(&self) -> usize {
        self.frame.len()
    }

    /// FFT length used for the correlation.
    pub fn fft_len(&self) -> usize {
        self.fft.size()
    }

    /// Last filtered period.
    pub fn period(&self) -> f32 {
        self.history.median()
    }

    /// Analyzes the first [`frame_len`](Self::frame_len) samples of `frame`.
    ///
    /// Missing samples are treated as silence.
    pub fn estimate(&mut self, frame: &[f32]) -> PitchEstimate {
        let n = frame.len().min(self.frame.len());
        self.frame[..n].copy_from_slice(&frame[..n]);
        self.frame[n..].fill(0.0);
        self.finish()
    }

    /// Analyzes the frame that starts at `start` in `ring`.
    pub fn estimate_ring(&mut self, ring: &RingBuffer, start: usize) -> PitchEstimate {
        ring.copy_window(start, &mut self.frame);
        self.finish()
    }

    /// Clears the median history.
    pub fn reset(&mut self) {
        self.history.fill(0.0);
    }

    fn finish(&mut self) -> PitchEstimate {
        let raw = self.detect();
        let period = self.history.push(raw);
        PitchEstimate {
            raw,
            period,
            voiced: raw != 0.0,
        }
    }

    /// Raw period of `self.frame`, or zero.
    fn detect(&mut self) -> f32 {
        let m = self.frame.len() / 2;
        let zero = Complex::new(0.0, 0.0);

        for (i, (a, b)) in self.lead.iter_mut().zip(self.span.iter_mut()).enumerate() {
            let x = self.frame.get(i).copied().unwrap_or(0.0);
            *a = if i < m { Complex::new(x, 0.0) } else { zero };
            *b = Complex::new(x, 0.0);
        }

        self.fft.forward_with_scratch(&mut self.lead, &mut self.scratch);
        self.fft.forward_with_scratch(&mut self.span, &mut self.scratch);
        for (a, b) in self.lead.iter_mut().zip(self.span.iter()) {
            *a = a.conj() * *b;
        }
        self.fft.inverse_with_scratch(&mut self.lead, &mut self.scratch);

        let x = &self.frame;
        let r0 = self.lead[0].re;
        let mut energy = r0;
        let mut cumulative = 0.0;
        // Normalized difference at lag zero is one by definition
        let (mut older, mut previous) = (1.0f32, 1.0f32);

        for k in 1..m {
            energy += x[k + m - 1] * x[k + m - 1] - x[k - 1] * x[k - 1];
            let diff = (r0 + energy - 2.0 * self.lead[k].re).max(0.0);
            cumulative += diff;
            let current = if cumulative > f32::EPSILON {
                diff * k as f32 / cumulative
            } else {
                1.0
            };

            if older > previous
                && previous < current
                && previous < self.config.threshold
                && k > self.config.min_lag
            {
                let curvature = older + current - 2.0 * previous;
                let offset = if curvature > 0.0 {
                    0.5 * (older - current) / curvature
                } else {
                    0.0
                };
                return (k - 1) as f32 + offset;
            }

            older = previous;
            previous = current;
        }

        0.0
    }
}
