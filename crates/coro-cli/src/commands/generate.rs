//! Test signal generation command.

use clap::{Args, Subcommand};
use coro_io::{WavSpec, write_wav};
use std::f32::consts::TAU;
use std::path::PathBuf;

#[derive(Args)]
pub struct GenerateArgs {
    #[command(subcommand)]
    command: GenerateCommand,
}

#[derive(Subcommand)]
enum GenerateCommand {
    /// Generate a sine tone
    Tone {
        /// Output WAV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Frequency in Hz
        #[arg(long, default_value = "220.0")]
        freq: f32,

        /// Duration in seconds
        #[arg(long, default_value = "1.0")]
        duration: f32,

        /// Sample rate
        #[arg(long, default_value = "44100")]
        sample_rate: u32,

        /// Amplitude (0-1)
        #[arg(long, default_value = "0.5")]
        amplitude: f32,
    },

    /// Generate an exponential pitch glide
    Glide {
        /// Output WAV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Start frequency in Hz
        #[arg(long, default_value = "110.0")]
        start: f32,

        /// End frequency in Hz
        #[arg(long, default_value = "440.0")]
        end: f32,

        /// Duration in seconds
        #[arg(long, default_value = "2.0")]
        duration: f32,

        /// Sample rate
        #[arg(long, default_value = "44100")]
        sample_rate: u32,

        /// Amplitude (0-1)
        #[arg(long, default_value = "0.5")]
        amplitude: f32,
    },

    /// Generate silence
    Silence {
        /// Output WAV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Duration in seconds
        #[arg(long, default_value = "1.0")]
        duration: f32,

        /// Sample rate
        #[arg(long, default_value = "44100")]
        sample_rate: u32,
    },
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    match args.command {
        GenerateCommand::Tone {
            output,
            freq,
            duration,
            sample_rate,
            amplitude,
        } => {
            println!("Generating {freq} Hz tone ({duration}s)...");
            let samples = glide(freq, freq, duration, sample_rate, amplitude);
            save(&output, &samples, sample_rate)
        }

        GenerateCommand::Glide {
            output,
            start,
            end,
            duration,
            sample_rate,
            amplitude,
        } => {
            println!("Generating glide {start} Hz -> {end} Hz ({duration}s)...");
            let samples = glide(start, end, duration, sample_rate, amplitude);
            save(&output, &samples, sample_rate)
        }

        GenerateCommand::Silence {
            output,
            duration,
            sample_rate,
        } => {
            println!("Generating {duration}s of silence...");
            let samples = vec![0.0; frames(duration, sample_rate)];
            save(&output, &samples, sample_rate)
        }
    }
}

fn frames(duration: f32, sample_rate: u32) -> usize {
    (duration.max(0.0) * sample_rate as f32) as usize
}

/// Sine whose frequency moves exponentially from `start` to `end`.
///
/// The phase is accumulated so the glide is click-free.
fn glide(start: f32, end: f32, duration: f32, sample_rate: u32, amplitude: f32) -> Vec<f32> {
    let len = frames(duration, sample_rate);
    let sr = sample_rate as f32;
    let ratio = (end / start).max(f32::MIN_POSITIVE);
    let mut phase = 0.0f32;

    (0..len)
        .map(|n| {
            let t = n as f32 / len.max(1) as f32;
            let freq = start * ratio.powf(t);
            let sample = amplitude * (TAU * phase).sin();
            phase = (phase + freq / sr).fract();
            sample
        })
        .collect()
}

fn save(path: &PathBuf, samples: &[f32], sample_rate: u32) -> anyhow::Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
    };
    write_wav(path, samples, spec)?;
    println!("Wrote {} samples to {}", samples.len(), path.display());
    Ok(())
}
