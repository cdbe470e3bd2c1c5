//! Property-based tests for the harmonizer kernel.

use coro_core::{ParameterInfo, RingBuffer};
use coro_harmonizer::{Grain, GrainPool, GrainWindow, HarmonizerKernel, MidiMessage, PARAM_COUNT};
use proptest::prelude::*;

fn grain(size: f32, ratio: f32, voice: usize) -> Grain {
    Grain {
        size,
        start: 0.0,
        pos: 0.0,
        ratio,
        gain: 1.0,
        pan: 0.0,
        voice,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// The active count never exceeds capacity and excess triggers are refused.
    #[test]
    fn grain_pool_never_exceeds_capacity(
        sizes in prop::collection::vec(1.0f32..64.0, 1..200),
        render_every in 1usize..8,
    ) {
        let ring = RingBuffer::new(256);
        let window = GrainWindow::default();
        let mut pool = GrainPool::<16>::new();

        for (i, &size) in sizes.iter().enumerate() {
            let was_full = pool.active_count() == pool.capacity();
            let accepted = pool.trigger(grain(size, 1.0, i % 4));
            prop_assert_eq!(accepted, !was_full);
            prop_assert!(pool.active_count() <= pool.capacity());
            if i % render_every == 0 {
                pool.render(&ring, &window, 1.0);
            }
        }
    }

    /// Parameter reads always land inside the descriptor range.
    #[test]
    fn params_clamped_to_range(address in 0usize..PARAM_COUNT, value in -1000.0f32..1000.0) {
        let mut kernel = HarmonizerKernel::new();
        kernel.set_param(address, value);
        let desc = kernel.param_info(address).unwrap();
        let stored = kernel.get_param(address);
        prop_assert!(stored >= desc.min && stored <= desc.max, "{} = {}", desc.string_id, stored);
    }

    /// Output is finite and independent of how the stream is cut into blocks.
    #[test]
    fn block_size_does_not_change_output(
        block in 1usize..700,
        freq in 80.0f32..900.0,
        note in 36u8..96,
    ) {
        let input: Vec<f32> = (0..6000)
            .map(|n| 0.6 * (std::f32::consts::TAU * freq * n as f32 / 44100.0).sin())
            .collect();

        let run = |block: usize| {
            let mut kernel = HarmonizerKernel::new();
            kernel.init(2, 44100.0).unwrap();
            kernel.midi(MidiMessage::NoteOn { note, velocity: 100 });
            let mut left = vec![0.0; input.len()];
            let mut right = vec![0.0; input.len()];
            let mut offset = 0;
            while offset < input.len() {
                let frames = block.min(input.len() - offset);
                kernel.render(frames, offset, &input, &mut [&mut left, &mut right]);
                offset += frames;
            }
            (left, right, kernel.stats())
        };

        let (left, right, stats) = run(block);
        let (ref_left, ref_right, _) = run(512);

        prop_assert!(left.iter().chain(&right).all(|s| s.is_finite()));
        prop_assert!(stats.peak_grains <= 192);
        prop_assert_eq!(stats.samples, 6000);
        prop_assert_eq!(left, ref_left);
        prop_assert_eq!(right, ref_right);
    }
}
