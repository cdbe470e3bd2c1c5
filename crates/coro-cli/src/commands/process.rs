//! File-based harmonizing command.

use crate::commands::common::{parse_key_val, progress_bar};
use clap::Args;
use coro_analysis::dynamics;
use coro_config::{Session, find_session, validate_param};
use coro_core::linear_to_db;
use coro_io::{HarmonizerEngine, StereoSamples, WavSpec, read_wav, write_wav_stereo};
use std::path::PathBuf;
use tracing::info;

/// Blocks handed to the engine between progress updates.
const BLOCKS_PER_UPDATE: usize = 64;

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file (mixed down to mono)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file (stereo)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Session file or factory session name
    #[arg(short, long)]
    session: Option<String>,

    /// Parameter overrides (e.g., "auto_voices=2"), applied after the session
    #[arg(short, long, value_parser = parse_key_val, number_of_values = 1)]
    param: Vec<(String, f32)>,

    /// Processing block size (default: the session's, or 512)
    #[arg(long)]
    block_size: Option<usize>,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,

    /// Write the final kernel settings as a session file
    #[arg(long, value_name = "FILE")]
    save_session: Option<PathBuf>,
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    println!("Reading {}...", args.input.display());
    let (samples, spec) = read_wav(&args.input)?;
    let sample_rate = spec.sample_rate as f32;

    println!(
        "  {} samples, {} Hz, {:.2}s",
        samples.len(),
        spec.sample_rate,
        samples.len() as f32 / sample_rate
    );

    let session = match &args.session {
        Some(name) => {
            let session = find_session(name)?;
            println!("Loading session: {}", session.name);
            session
        }
        None => Session::default(),
    };

    let block_size = args.block_size.unwrap_or(session.block_size);
    let mut engine = HarmonizerEngine::new(sample_rate, block_size)?;
    session.apply(engine.kernel_mut())?;
    for (name, value) in &args.param {
        let param = validate_param(name, *value)?;
        engine.kernel_mut().set(param, *value);
    }
    engine.schedule_all(session.timed_events(sample_rate));
    info!(block_size, events = engine.pending_events(), "processing");

    let pb = progress_bar(samples.len() as u64)?;
    let mut output = StereoSamples::default();
    let mut done = 0;
    for chunk in samples.chunks(engine.block_size() * BLOCKS_PER_UPDATE) {
        output.extend(&engine.process(chunk));
        done += chunk.len();
        pb.set_position(done as u64);
    }
    pb.finish_with_message("done");

    let mixed = output.to_mono();
    let stats = engine.stats();

    println!("\nStats:");
    println!(
        "  Input:  RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(dynamics::rms(&samples)),
        linear_to_db(dynamics::peak(&samples))
    );
    println!(
        "  Output: RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(dynamics::rms(&mixed)),
        linear_to_db(dynamics::peak(&mixed))
    );
    println!(
        "  Kernel: {} blocks, {} pitch marks, {} key changes",
        stats.blocks, stats.mark_advances, stats.key_changes
    );
    println!(
        "  Grains: peak {} active, {} dropped",
        stats.peak_grains, stats.dropped_grains
    );

    let non_finite = dynamics::non_finite_count(&mixed);
    if non_finite > 0 {
        anyhow::bail!("Output contains {non_finite} non-finite samples");
    }

    let out_spec = WavSpec {
        channels: 2,
        sample_rate: spec.sample_rate,
        bits_per_sample: args.bit_depth,
    };

    println!("\nWriting {}...", args.output.display());
    write_wav_stereo(&args.output, &output, out_spec)?;

    if let Some(path) = &args.save_session {
        let mut snapshot = Session::from_kernel(&session.name, engine.kernel());
        snapshot.block_size = engine.block_size();
        snapshot.midi = session.midi.clone();
        snapshot.save(path)?;
        println!("Saved session to {}", path.display());
    }

    println!("Done!");
    Ok(())
}
