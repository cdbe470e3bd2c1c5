//! Control-value smoothing for zipper-free changes.
//!
//! Pitch ratios and gains must never jump: a step in a voice's ratio is an
//! audible click in every grain that voice emits. This module provides the two
//! smoothing laws the harmonizer uses.
//!
//! ## Smoothing Methods
//!
//! - **Exponential** ([`SmoothedParam`]): `y += coeff * (target - y)` per step.
//!   A step is whatever the caller decides; voice ratios advance once per
//!   pitch mark, not once per sample.
//! - **Linear** ([`LinearSmoothedParam`]): moves toward the target by a fixed
//!   amount per step and lands on it exactly.
//!
//! ## Usage
//!
//! ```rust
//! use coro_core::{LinearSmoothedParam, SmoothedParam};
//!
//! // 80/20 dezippering of a transposition ratio
//! let mut ratio = SmoothedParam::with_coeff(1.0, 0.2);
//! ratio.set_target(1.5);
//! for _ in 0..64 {
//!     ratio.advance();
//! }
//! assert!(ratio.is_settled());
//!
//! // Gain slewing at 0.001 per sample
//! let mut gain = LinearSmoothedParam::with_rate(0.0, 0.001);
//! gain.set_target(1.0);
//! for _ in 0..1100 {
//!     gain.advance();
//! }
//! assert_eq!(gain.get(), 1.0);
//! ```

/// A value that approaches its target exponentially.
///
/// Each [`advance`](Self::advance) moves the current value `coeff` of the way
/// to the target: `y[n] = (1 - coeff) * y[n-1] + coeff * target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Fraction of the remaining distance covered per step (1 = instant)
    coeff: f32,
}

impl SmoothedParam {
    /// Creates a parameter that follows its target instantly.
    pub fn new(initial: f32) -> Self {
        Self::with_coeff(initial, 1.0)
    }

    /// Creates a parameter with a fixed per-step coefficient.
    ///
    /// `coeff` is clamped to `[0, 1]`.
    pub fn with_coeff(initial: f32, coeff: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: coeff.clamp(0.0, 1.0),
        }
    }

    /// Sets the value to smooth towards.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Sets target and current value together (no smoothing).
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Changes the smoothing coefficient, clamped to `[0, 1]`.
    pub fn set_coeff(&mut self, coeff: f32) {
        self.coeff = coeff.clamp(0.0, 1.0);
    }

    /// Advances one step and returns the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// True once the value is within 1e-6 of the target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// Jumps to the target.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// A value that slews toward its target at a constant rate.
///
/// Unlike a time-based ramp, the rate stays fixed when the target moves
/// mid-transition, so the value never overshoots and never stalls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearSmoothedParam {
    current: f32,
    target: f32,
    /// Maximum change per step (always non-negative)
    rate: f32,
}

impl LinearSmoothedParam {
    /// Creates a parameter that follows its target instantly.
    pub fn new(initial: f32) -> Self {
        Self::with_rate(initial, f32::INFINITY)
    }

    /// Creates a parameter that moves at most `rate` per step.
    pub fn with_rate(initial: f32, rate: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            rate: rate.abs(),
        }
    }

    /// Sets the value to slew towards.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Sets target and current value together.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
    }

    /// Advances one step and returns the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let delta = self.target - self.current;
        if delta.abs() <= self.rate {
            self.current = self.target;
        } else {
            self.current += libm::copysignf(self.rate, delta);
        }
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// True once the value sits exactly on the target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }

    /// Jumps to the target.
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }
}

impl Default for LinearSmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothed_param_instant_by_default() {
        let mut param = SmoothedParam::new(1.0);
        param.set_target(0.5);
        assert_eq!(param.advance(), 0.5);
    }

    #[test]
    fn smoothed_param_eighty_twenty() {
        let mut param = SmoothedParam::with_coeff(1.0, 0.2);
        param.set_target(2.0);
        let first = param.advance();
        assert!((first - (0.8 * 1.0 + 0.2 * 2.0)).abs() < 1e-6);
        let second = param.advance();
        assert!((second - (0.8 * first + 0.2 * 2.0)).abs() < 1e-6);
    }

    #[test]
    fn smoothed_param_converges() {
        let mut param = SmoothedParam::with_coeff(0.0, 0.2);
        param.set_target(1.0);
        for _ in 0..100 {
            param.advance();
        }
        assert!(param.is_settled(), "got {}", param.get());
    }

    #[test]
    fn smoothed_param_coeff_clamped() {
        let mut param = SmoothedParam::with_coeff(0.0, 5.0);
        param.set_target(1.0);
        assert_eq!(param.advance(), 1.0);

        param.set_coeff(-1.0);
        param.set_target(3.0);
        assert_eq!(param.advance(), 1.0);
    }

    #[test]
    fn linear_smoothed_constant_rate() {
        let mut param = LinearSmoothedParam::with_rate(0.0, 0.001);
        param.set_target(1.0);
        for _ in 0..500 {
            param.advance();
        }
        assert!((param.get() - 0.5).abs() < 1e-3, "got {}", param.get());
        assert!(!param.is_settled());
    }

    #[test]
    fn linear_smoothed_lands_exactly() {
        let mut param = LinearSmoothedParam::with_rate(1.0, 0.3);
        param.set_target(0.0);
        for _ in 0..4 {
            param.advance();
        }
        assert_eq!(param.get(), 0.0);
        assert!(param.is_settled());
        // No oscillation around the target
        param.advance();
        assert_eq!(param.get(), 0.0);
    }

    #[test]
    fn linear_smoothed_retarget_mid_ramp() {
        let mut param = LinearSmoothedParam::with_rate(0.0, 0.1);
        param.set_target(1.0);
        param.advance();
        param.advance();
        param.set_target(-1.0);
        param.advance();
        assert!((param.get() - 0.1).abs() < 1e-6);
    }
}
