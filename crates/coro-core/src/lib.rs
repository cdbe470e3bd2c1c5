//! Coro Core - DSP primitives for the harmonizer kernel
//!
//! This crate provides the allocation-free building blocks the pitch tracker
//! and grain synthesizer are assembled from. Everything here runs on the audio
//! thread: buffers are sized once at construction and never grow.
//!
//! # Core Abstractions
//!
//! ## Sample Storage
//!
//! - [`RingBuffer`] - Power-of-two circular store with guard samples past the
//!   seam, so four-point interpolated reads never branch on wraparound
//!
//! ## Parameter Smoothing
//!
//! - [`SmoothedParam`] - One-pole smoothing with a fixed per-step coefficient
//! - [`LinearSmoothedParam`] - Constant-rate slew toward a target
//!
//! ## Parameter Introspection
//!
//! - [`ParameterInfo`] - Index-based parameter access with clamping
//! - [`ParamDescriptor`] - Range, unit and identity metadata for one parameter
//!
//! ## Utilities
//!
//! - Interpolation: [`cubic_interp`]
//! - Pitch math: [`semitones_to_ratio`], [`ratio_to_semitones`], [`freq_to_midi`]
//! - Level math: [`linear_to_db`], [`pan_gains`]
//! - Numeric hygiene: [`flush_denormal`], [`scrub`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature in
//! your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! coro-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use coro_core::{RingBuffer, SmoothedParam};
//!
//! let mut ring = RingBuffer::new(1024);
//! for n in 0..2048 {
//!     ring.write(n as f32);
//! }
//! assert_eq!(ring.at(ring.write_pos() + 1023), 2047.0);
//!
//! let mut ratio = SmoothedParam::with_coeff(1.0, 0.2);
//! ratio.set_target(2.0);
//! ratio.advance();
//! assert!((ratio.get() - 1.2).abs() < 1e-6);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod math;
pub mod param;
pub mod param_info;
pub mod ring;

pub use math::{
    cubic_interp, flush_denormal, freq_to_midi, linear_to_db, pan_gains, ratio_to_semitones, scrub,
    semitones_to_ratio,
};
pub use param::{LinearSmoothedParam, SmoothedParam};
pub use param_info::{ParamDescriptor, ParamFlags, ParamId, ParamUnit, ParameterInfo};
pub use ring::{GUARD_SAMPLES, RingBuffer};
