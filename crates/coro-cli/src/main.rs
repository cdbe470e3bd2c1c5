//! Coro CLI - offline front end for the coro harmonizer.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coro")]
#[command(author, version, about = "Coro PSOLA harmonizer CLI", long_about = None)]
struct Cli {
    /// Log kernel and engine events (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harmonize an audio file
    Process(commands::process::ProcessArgs),

    /// Track the pitch of an audio file
    Pitch(commands::pitch::PitchArgs),

    /// Generate test signals
    Generate(commands::generate::GenerateArgs),

    /// List harmonizer parameters
    Params(commands::params::ParamsArgs),

    /// Compare two audio files
    Compare(commands::compare::CompareArgs),

    /// Show WAV file metadata
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Process(args) => commands::process::run(args),
        Commands::Pitch(args) => commands::pitch::run(args),
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Params(args) => commands::params::run(args),
        Commands::Compare(args) => commands::compare::run(args),
        Commands::Info(args) => commands::info::run(args),
    }
}
