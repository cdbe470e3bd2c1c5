//! Coro Analysis - pitch and correlation tools
//!
//! - [`fft`] - FFT wrapper with windowing functions and allocation-free transforms
//! - [`pitch`] - CMNDF period estimator with median post-filter
//! - [`xcorr`] - Cross-correlation and lag alignment
//! - [`dynamics`] - RMS and peak levels
//!
//! ## Example
//!
//! ```rust
//! use coro_analysis::{PitchConfig, PitchEstimator};
//!
//! let sample_rate = 48000.0;
//! let mut estimator = PitchEstimator::new(PitchConfig::default());
//! let frame: Vec<f32> = (0..estimator.frame_len())
//!     .map(|n| (std::f32::consts::TAU * 220.0 * n as f32 / sample_rate).sin())
//!     .collect();
//!
//! let raw = estimator.estimate(&frame).raw;
//! assert!((sample_rate / raw - 220.0).abs() < 1.0);
//! ```

pub mod dynamics;
pub mod fft;
pub mod pitch;
pub mod xcorr;

pub use fft::{Fft, Window};
pub use pitch::{MedianFilter, PITCH_HISTORY, PitchConfig, PitchEstimate, PitchEstimator};
pub use xcorr::{Alignment, align, correlation, xcorr_fft};
