//! Example job command.

use crate::commands::telemetry;
use crate::config::CliConfig;
use anyhow::{Context, Result};
use colored::Colorize;
use runlog_jobs::{run_example, ExampleArgs};
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct ExampleCommand {
    pub data_path: Option<PathBuf>,
    pub greeting: Option<String>,
    pub outputs_dir: Option<PathBuf>,
}

impl ExampleCommand {
    fn is_empty(&self) -> bool {
        self.data_path.is_none() && self.greeting.is_none() && self.outputs_dir.is_none()
    }
}

pub async fn execute(command: ExampleCommand, config: &CliConfig) -> Result<()> {
    let args = resolve_args(command, config)?;

    let sink = telemetry::build_sink(config)?;
    let result = run_example(&args, &sink).await;
    telemetry::close_sink(&sink).await;

    let outcome = result.context("Example job failed")?;
    if outcome.telemetry_failures > 0 {
        eprintln!(
            "{} {} telemetry call(s) failed; job outputs are unaffected",
            "warning:".yellow().bold(),
            outcome.telemetry_failures
        );
    }
    eprintln!("{}", format!("Wrote {}", outcome.output_file.display()).dimmed());
    Ok(())
}

fn resolve_args(command: ExampleCommand, config: &CliConfig) -> Result<ExampleArgs> {
    if command.is_empty() {
        eprintln!("{} Using debug args because no args were passed", "WARNING:".yellow().bold());
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let mut args = ExampleArgs::debug_defaults(&cwd);
        if let Some(outputs_dir) = &config.outputs_dir {
            args.outputs_dir.clone_from(outputs_dir);
        }
        return Ok(args);
    }

    let data_path = command.data_path.context("--data-path is required when other arguments are given")?;
    let outputs_dir = command
        .outputs_dir
        .or_else(|| config.outputs_dir.clone())
        .unwrap_or_else(|| PathBuf::from("./outputs"));
    Ok(ExampleArgs::new(data_path, command.greeting.unwrap_or_else(|| "Hello".to_string()), outputs_dir))
}
