//! Fixed tuning of the kernel.
//!
//! The smoothing and transposition constants were tuned by ear. Buffer sizes
//! follow from them and are allocated once in `init`.

use coro_analysis::PitchConfig;

/// Input ring length in samples (power of two).
pub const RING_LEN: usize = 4096;

/// Longest trackable period in samples.
pub const MAX_PERIOD: usize = 600;

/// FFT length of the period estimator, `(2 * MAX_PERIOD).next_power_of_two()`.
pub const FFT_LEN: usize = 2048;

/// Samples between period estimates.
pub const ESTIMATE_INTERVAL: u32 = 256;

/// Acceptance threshold of the normalized difference function.
pub const CMNDF_THRESHOLD: f32 = 0.2;

/// Lags at or below this are never reported as a period.
pub const MIN_LAG: usize = 20;

/// Period assumed before the first voiced estimate.
pub const DEFAULT_PERIOD: f32 = 400.0;

/// A mark advances once it trails the analysis point by this many periods.
pub const MARK_ADVANCE: f32 = 1.25;

/// Distance from the write cursor back to the analysis point.
pub const ANALYSIS_LAG: usize = 2 * MAX_PERIOD;

/// Voice slots: lead, three harmony voices, twelve MIDI voices.
pub const VOICE_COUNT: usize = 16;

/// First slot reserved for MIDI voices.
pub const FIRST_MIDI_SLOT: usize = 4;

/// Grains per voice slot.
pub const GRAINS_PER_VOICE: usize = 12;

/// Grain pool capacity.
pub const GRAIN_POOL: usize = GRAINS_PER_VOICE * VOICE_COUNT;

/// Points in the grain window table.
pub const WINDOW_LEN: usize = MAX_PERIOD;

/// Zero samples padding each side of the window table.
pub const WINDOW_SHOULDER: usize = 3;

/// Per-mark smoothing coefficient for voice ratios.
pub const RATIO_SMOOTHING: f32 = 0.2;

/// Harmony gain slew per sample.
pub const HARMONY_GAIN_RATE: f32 = 0.001;

/// Transposition above which grains are shortened.
pub const SHORTEN_THRESHOLD: f32 = 1.7;

/// Harmony re-analysis waits `sample_rate / DEBOUNCE_DIVISOR` samples after a MIDI change.
pub const DEBOUNCE_DIVISOR: f32 = 50.0;

/// Grain countdown of a voice after reset.
pub const INITIAL_GRAIN_COUNTDOWN: f32 = 250.0;

/// Input gain while bypassed.
pub const BYPASS_GAIN: f32 = 0.5;

/// Target distance of the lead resampler behind the write cursor.
pub const LEAD_LATENCY: f32 = 512.0;

/// Velocity of the automatic harmony voices.
pub const HARMONY_VELOCITY: u8 = 65;

/// Most output channels the kernel renders.
pub const MAX_CHANNELS: usize = 2;

/// Capacity of the control queue.
pub const CONTROL_QUEUE_LEN: usize = 1024;

/// Period estimator settings derived from the constants above.
pub fn pitch_config() -> PitchConfig {
    PitchConfig {
        max_period: MAX_PERIOD,
        min_lag: MIN_LAG,
        threshold: CMNDF_THRESHOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coro_analysis::PitchEstimator;

    #[test]
    fn test_derived_sizes() {
        assert!(RING_LEN.is_power_of_two());
        assert!(RING_LEN > 3 * MAX_PERIOD);
        assert_eq!(FFT_LEN, (2 * MAX_PERIOD).next_power_of_two());
        assert_eq!(GRAIN_POOL, 192);
        assert_eq!(PitchEstimator::new(pitch_config()).fft_len(), FFT_LEN);
    }
}
