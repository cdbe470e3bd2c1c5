//! A/B comparison command.

use clap::Args;
use coro_analysis::{align, dynamics};
use coro_core::linear_to_db;
use coro_io::read_wav;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct CompareArgs {
    /// Reference audio file
    #[arg(value_name = "REFERENCE")]
    reference: PathBuf,

    /// File to compare against the reference
    #[arg(value_name = "OTHER")]
    other: PathBuf,

    /// Largest delay to search, in samples
    #[arg(long, default_value = "4096")]
    max_lag: usize,

    /// Samples correlated per lag
    #[arg(long, default_value = "8192")]
    window: usize,

    /// Write a JSON report
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Comparison summary.
#[derive(Debug, Serialize)]
struct Report {
    sample_rate: u32,
    samples: usize,
    lag: usize,
    correlation: f32,
    reference_rms_db: f32,
    other_rms_db: f32,
    reference_peak_db: f32,
    other_peak_db: f32,
}

pub fn run(args: CompareArgs) -> anyhow::Result<()> {
    println!("A/B Comparison");
    println!("==============");
    println!("  Reference: {}", args.reference.display());
    println!("  Other:     {}", args.other.display());
    println!();

    let (reference, ref_spec) = read_wav(&args.reference)?;
    let (other, other_spec) = read_wav(&args.other)?;

    if ref_spec.sample_rate != other_spec.sample_rate {
        anyhow::bail!(
            "Sample rate mismatch: {} vs {}",
            ref_spec.sample_rate,
            other_spec.sample_rate
        );
    }

    let window = args.window.min(reference.len()).min(other.len());
    if window == 0 {
        anyhow::bail!("Nothing to compare: one of the files is empty");
    }
    let alignment = align(&reference, &other, args.max_lag, window);

    let report = Report {
        sample_rate: ref_spec.sample_rate,
        samples: reference.len().min(other.len()),
        lag: alignment.lag,
        correlation: alignment.correlation,
        reference_rms_db: linear_to_db(dynamics::rms(&reference)),
        other_rms_db: linear_to_db(dynamics::rms(&other)),
        reference_peak_db: linear_to_db(dynamics::peak(&reference)),
        other_peak_db: linear_to_db(dynamics::peak(&other)),
    };

    println!("Alignment");
    println!("---------");
    println!(
        "  Lag:         {} samples ({:.2} ms)",
        report.lag,
        report.lag as f32 * 1000.0 / report.sample_rate as f32
    );
    println!("  Correlation: {:.4}", report.correlation);
    println!();
    println!(
        "  Reference - RMS: {:.1} dB, Peak: {:.1} dB",
        report.reference_rms_db, report.reference_peak_db
    );
    println!(
        "  Other     - RMS: {:.1} dB, Peak: {:.1} dB",
        report.other_rms_db, report.other_peak_db
    );

    if let Some(path) = &args.output {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        println!("\nReport written to {}", path.display());
    }

    Ok(())
}
