//! Runlog CLI - job steps for the managed training platform
//!
//! Provides the `runlog` command. Each subcommand is one job step; steps that report
//! tags and metrics log them remotely when `MLFLOW_TRACKING_URI` is set and to stderr
//! otherwise.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Runlog CLI - training job scaffolding
#[derive(Parser, Debug)]
#[command(
    name = "runlog",
    author,
    version,
    about = "Runlog - training job steps with tag and metric logging"
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the example job
    ///
    /// Tags the run with its inputs, logs an `answer` metric and a `value` series,
    /// and writes `hello.txt` to the outputs directory. Without any arguments it
    /// runs with debug defaults.
    Example {
        /// Path where the input data is stored
        #[arg(long)]
        data_path: Option<PathBuf>,

        /// Word with which to greet the world
        #[arg(long)]
        greeting: Option<String>,

        /// Directory where outputs are written
        #[arg(long)]
        outputs_dir: Option<PathBuf>,
    },

    /// Write content to `file.txt` for a later step
    Write {
        /// Content to write
        #[arg(long)]
        content: String,

        /// Data directory (defaults to $REPO_ROOT/data/outputs)
        #[arg(long)]
        data_path: Option<PathBuf>,
    },

    /// Print `file.txt` written by an earlier step
    Read {
        /// Data directory (defaults to $REPO_ROOT/data/outputs)
        #[arg(long)]
        data_path: Option<PathBuf>,
    },
}

fn parse_level(level: Option<&str>) -> Level {
    match level.map(str::to_lowercase).as_deref() {
        Some("trace") => Level::TRACE,
        Some("debug") => Level::DEBUG,
        Some("info") => Level::INFO,
        Some("error") => Level::ERROR,
        _ => Level::WARN,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cli_config = config::CliConfig::discover_and_load();

    // Diagnostics share stderr with local telemetry; keep them quiet by default.
    let level = parse_level(args.log_level.as_deref().or(cli_config.log_level.as_deref()));
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Example { data_path, greeting, outputs_dir } => {
            let command = commands::example::ExampleCommand { data_path, greeting, outputs_dir };
            commands::example::execute(command, &cli_config).await
        }
        Command::Write { content, data_path } => commands::steps::write(&content, data_path),
        Command::Read { data_path } => commands::steps::read(data_path),
    }
}
