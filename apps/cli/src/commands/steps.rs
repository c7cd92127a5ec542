//! File hand-off steps (`write` / `read`).

use anyhow::{Context, Result};
use colored::Colorize;
use runlog_jobs::{read_step, write_step, StepLayout};
use std::path::{Path, PathBuf};

pub fn write(content: &str, data_path: Option<PathBuf>) -> Result<()> {
    let layout = resolve_layout(data_path)?;
    let file = write_step(content, &layout).context("Write step failed")?;
    eprintln!("{}", format!("Wrote {}", file.display()).dimmed());
    Ok(())
}

pub fn read(data_path: Option<PathBuf>) -> Result<()> {
    let layout = resolve_layout(data_path)?;
    let content = read_step(&layout).context("Read step failed")?;
    println!("{content}");
    Ok(())
}

fn resolve_layout(data_path: Option<PathBuf>) -> Result<StepLayout> {
    if let Some(data_path) = data_path {
        return Ok(StepLayout::new(data_path));
    }

    let repo_root = std::env::var("REPO_ROOT")
        .context("--data-path was not given and REPO_ROOT is not set")?;
    eprintln!("{} Using debug args because no args were passed", "WARNING:".yellow().bold());
    Ok(StepLayout::for_repo_root(Path::new(&repo_root)))
}
