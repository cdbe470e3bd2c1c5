//! Property-based tests for the period estimator.

use coro_analysis::{PitchConfig, PitchEstimator};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any bounded input yields either no estimate or a lag inside the search range.
    #[test]
    fn raw_period_within_search_range(
        samples in prop::collection::vec(-1.0f32..=1.0, 1200)
    ) {
        let mut estimator = PitchEstimator::new(PitchConfig::default());
        let estimate = estimator.estimate(&samples);
        prop_assert!(estimate.raw.is_finite());
        prop_assert!(estimate.period.is_finite());
        if estimate.voiced {
            prop_assert!(estimate.raw > 19.0 && estimate.raw < 600.0, "raw {}", estimate.raw);
        } else {
            prop_assert_eq!(estimate.raw, 0.0);
        }
    }

    /// Sine periods across the trackable range are recovered within a sample.
    #[test]
    fn sine_period_recovered(period in 40.0f32..550.0) {
        let mut estimator = PitchEstimator::new(PitchConfig::default());
        let frame: Vec<f32> = (0..estimator.frame_len())
            .map(|n| (std::f32::consts::TAU * n as f32 / period).sin())
            .collect();
        let raw = estimator.estimate(&frame).raw;
        prop_assert!((raw - period).abs() <= 1.0, "period {} raw {}", period, raw);
    }
}
