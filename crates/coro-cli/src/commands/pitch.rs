//! Offline pitch tracking command.

use crate::commands::common::note_name;
use clap::Args;
use coro_analysis::PitchEstimator;
use coro_harmonizer::tuning::pitch_config;
use coro_io::read_wav;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct PitchArgs {
    /// Input WAV file (mixed down to mono)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Samples between analysis frames
    #[arg(long, default_value = "1024")]
    hop: usize,

    /// Print one JSON object per frame instead of a table
    #[arg(long)]
    json: bool,
}

/// One analysis frame.
#[derive(Debug, Serialize)]
struct PitchFrame {
    time: f32,
    raw_period: f32,
    period: f32,
    frequency: Option<f32>,
    voiced: bool,
}

pub fn run(args: PitchArgs) -> anyhow::Result<()> {
    if args.hop == 0 {
        anyhow::bail!("--hop must be positive");
    }

    let (samples, spec) = read_wav(&args.input)?;
    let sample_rate = spec.sample_rate as f32;
    let mut estimator = PitchEstimator::new(pitch_config());
    let frame_len = estimator.frame_len();

    if samples.len() < frame_len {
        anyhow::bail!(
            "Input is {} samples; pitch tracking needs at least {frame_len}",
            samples.len()
        );
    }

    if !args.json {
        println!("Pitch: {}", args.input.display());
        println!(
            "{:>8}  {:>9}  {:>9}  {:>9}  Note",
            "Time", "Raw", "Period", "Hz"
        );
    }

    let mut voiced_frames = 0usize;
    let mut frames = 0usize;
    for start in (0..=samples.len() - frame_len).step_by(args.hop) {
        let estimate = estimator.estimate(&samples[start..start + frame_len]);
        let frame = PitchFrame {
            time: start as f32 / sample_rate,
            raw_period: estimate.raw,
            period: estimate.period,
            frequency: estimate.frequency(sample_rate),
            voiced: estimate.voiced,
        };
        frames += 1;
        voiced_frames += usize::from(frame.voiced);

        if args.json {
            println!("{}", serde_json::to_string(&frame)?);
        } else {
            let hz = frame.frequency.unwrap_or(0.0);
            println!(
                "{:>7.3}s  {:>9.2}  {:>9.2}  {:>9.2}  {}",
                frame.time,
                frame.raw_period,
                frame.period,
                hz,
                if frame.voiced { note_name(hz) } else { "-".into() }
            );
        }
    }

    if !args.json {
        println!("\n{voiced_frames}/{frames} frames voiced");
    }
    Ok(())
}
