//! Integration tests for coro-io WAV I/O and the block host.

use coro_harmonizer::{HarmonizerParam, MidiMessage};
use coro_io::{
    HarmonizerEngine, StereoSamples, TimedEvent, WavFormat, WavSpec, read_wav, read_wav_info,
    read_wav_stereo, write_wav, write_wav_stereo,
};
use tempfile::NamedTempFile;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sine_wave(sample_rate: u32, freq_hz: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            0.5 * (2.0 * std::f32::consts::PI * freq_hz * i as f32 / sample_rate as f32).sin()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// WAV roundtrips
// ---------------------------------------------------------------------------

#[test]
fn wav_roundtrip_mono_f32() {
    for sr in [44100, 48000, 96000] {
        let samples = sine_wave(sr, 440.0, sr as usize / 4);
        let spec = WavSpec {
            channels: 1,
            sample_rate: sr,
            bits_per_sample: 32,
        };

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, spec).unwrap();

        let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
        assert_eq!(loaded_spec, spec);
        assert_eq!(loaded, samples);
    }
}

#[test]
fn wav_roundtrip_mono_i16_quantized() {
    let samples = sine_wave(44100, 220.0, 4410);
    let spec = WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &samples, spec).unwrap();
    let (loaded, _) = read_wav(file.path()).unwrap();

    for (a, b) in samples.iter().zip(&loaded) {
        assert!((a - b).abs() < 1.0 / 16384.0, "{a} vs {b}");
    }
}

#[test]
fn wav_i16_clips_out_of_range() {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
    };
    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &[2.0, -2.0], spec).unwrap();
    let (loaded, _) = read_wav(file.path()).unwrap();
    assert!(loaded[0] > 0.999 && loaded[0] < 1.0);
    assert_eq!(loaded[1], -1.0);
}

#[test]
fn wav_roundtrip_stereo() {
    let left = sine_wave(48000, 440.0, 4800);
    let right = sine_wave(48000, 660.0, 4800);
    let stereo = StereoSamples::new(left, right);

    let file = NamedTempFile::new().unwrap();
    write_wav_stereo(file.path(), &stereo, WavSpec {
        channels: 2,
        sample_rate: 48000,
        bits_per_sample: 32,
    })
    .unwrap();

    let (loaded, spec) = read_wav_stereo(file.path()).unwrap();
    assert_eq!(spec.channels, 2);
    assert_eq!(loaded, stereo);
}

#[test]
fn mono_file_read_as_stereo_duplicates() {
    let samples = sine_wave(44100, 440.0, 100);
    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &samples, WavSpec::default()).unwrap();

    let (stereo, _) = read_wav_stereo(file.path()).unwrap();
    assert_eq!(stereo.left, samples);
    assert_eq!(stereo.right, samples);
}

#[test]
fn wav_info_reports_metadata() {
    let file = NamedTempFile::new().unwrap();
    let spec = WavSpec {
        channels: 1,
        sample_rate: 48000,
        bits_per_sample: 24,
    };
    write_wav(file.path(), &vec![0.0; 12000], spec).unwrap();

    let info = read_wav_info(file.path()).unwrap();
    assert_eq!(info.channels, 1);
    assert_eq!(info.sample_rate, 48000);
    assert_eq!(info.bits_per_sample, 24);
    assert_eq!(info.num_frames, 12000);
    assert_eq!(info.format, WavFormat::Pcm);
    assert!((info.duration_secs - 0.25).abs() < 1e-9);
}

#[test]
fn missing_file_is_an_error() {
    assert!(read_wav("/nonexistent/voice.wav").is_err());
}

// ---------------------------------------------------------------------------
// Block host
// ---------------------------------------------------------------------------

#[test]
fn engine_output_independent_of_block_size() {
    let input = sine_wave(44100, 220.0, 8000);
    let events = [
        TimedEvent::midi(0, MidiMessage::NoteOn {
            note: 67,
            velocity: 100,
        }),
        TimedEvent::param(3000, HarmonizerParam::AutoVoices.address(), 4.0),
        TimedEvent::midi(5000, MidiMessage::NoteOff { note: 67 }),
    ];

    let mut reference = HarmonizerEngine::new(44100.0, 4096).unwrap();
    reference.schedule_all(events);
    let expected = reference.process(&input);

    for block in [1, 37, 256] {
        let mut engine = HarmonizerEngine::new(44100.0, block).unwrap();
        engine.schedule_all(events);
        let out = engine.process(&input);
        assert_eq!(out, expected, "block size {block}");
    }
}

#[test]
fn engine_harmonizes_a_file() {
    let sr = 44100;
    let file_in = NamedTempFile::new().unwrap();
    let file_out = NamedTempFile::new().unwrap();
    write_wav(file_in.path(), &sine_wave(sr, 220.0, sr as usize), WavSpec::default()).unwrap();

    let (input, spec) = read_wav(file_in.path()).unwrap();
    let mut engine = HarmonizerEngine::new(spec.sample_rate as f32, 512).unwrap();
    let out = engine.process(&input);
    write_wav_stereo(file_out.path(), &out, spec).unwrap();

    let (loaded, loaded_spec) = read_wav_stereo(file_out.path()).unwrap();
    assert_eq!(loaded_spec.channels, 2);
    assert_eq!(loaded.len(), input.len());
    assert!(loaded.left.iter().chain(&loaded.right).all(|s| s.is_finite()));

    let tail_energy: f32 = loaded.left[sr as usize / 2..].iter().map(|s| s * s).sum();
    assert!(tail_energy > 1.0, "tail energy {tail_energy}");
    assert!((engine.kernel().period() - sr as f32 / 220.0).abs() < 1.0);
}

#[test]
fn engine_applies_late_events_immediately() {
    let mut engine = HarmonizerEngine::new(44100.0, 64).unwrap();
    engine.process(&vec![0.0; 500]);
    engine.schedule(TimedEvent::param(10, HarmonizerParam::Bypass.address(), 1.0));

    let out = engine.process(&[0.4; 8]);
    assert!(out.left.iter().all(|&s| s == 0.2));
    assert!(engine.kernel().settings().bypass);
}
