//! Runlog settings files.
//!
//! `~/.runlog/config.toml` is read first, then `./.runlogrc` in the working
//! directory; keys set in the later file win. Command-line flags and `MLFLOW_*`
//! variables take precedence over both.
//!
//! ```toml
//! log_level = "info"
//! outputs_dir = "../outputs"
//!
//! [telemetry]
//! timeout_secs = 10
//! max_retries = 2
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Diagnostics level when `--log-level` is not given
    #[serde(default)]
    pub log_level: Option<String>,

    /// Where `runlog example` writes `hello.txt` when `--outputs-dir` is not given
    #[serde(default)]
    pub outputs_dir: Option<PathBuf>,

    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

/// Overrides for the remote tracking client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetrySettings {
    /// Upper bound for a single tracking request, in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Retries for unreachable or failing tracking servers
    #[serde(default)]
    pub max_retries: Option<u32>,
}

#[derive(Debug, Error)]
pub enum CliConfigError {
    /// No settings file at this path; not an error for discovery.
    #[error("no runlog settings at {0}")]
    NotFound(String),

    #[error("cannot read runlog settings {0}")]
    ReadError(String),

    #[error("invalid runlog settings {0}")]
    ParseError(String),
}

pub type CliConfigResult<T> = std::result::Result<T, CliConfigError>;

impl CliConfig {
    /// Read one settings file.
    pub fn load_from_file(path: &Path) -> CliConfigResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CliConfigError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(CliConfigError::ReadError(format!("{}: {e}", path.display()))),
        };
        toml::from_str(&content)
            .map_err(|e| CliConfigError::ParseError(format!("{}: {e}", path.display())))
    }

    /// `~/.runlog/config.toml`, or `./.runlog/config.toml` without `HOME`.
    pub fn default_global_path() -> PathBuf {
        let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
        home.join(".runlog").join("config.toml")
    }

    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".runlogrc")
    }

    /// Settings from the global file overlaid with `.runlogrc`.
    ///
    /// A file that exists but cannot be read or parsed is reported and skipped, so a
    /// broken settings file never stops a job.
    pub fn discover_and_load() -> Self {
        let mut config = Self::default();
        for path in [Self::default_global_path(), Self::default_local_path()] {
            match Self::load_from_file(&path) {
                Ok(loaded) => config.merge(&loaded),
                Err(CliConfigError::NotFound(_)) => {}
                Err(e) => eprintln!("warning: ignoring config: {e}"),
            }
        }
        config
    }

    /// Overlay the keys `other` sets onto `self`.
    pub fn merge(&mut self, other: &Self) {
        if let Some(ref log_level) = other.log_level {
            self.log_level = Some(log_level.clone());
        }
        if let Some(ref outputs_dir) = other.outputs_dir {
            self.outputs_dir = Some(outputs_dir.clone());
        }
        if let Some(timeout_secs) = other.telemetry.timeout_secs {
            self.telemetry.timeout_secs = Some(timeout_secs);
        }
        if let Some(max_retries) = other.telemetry.max_retries {
            self.telemetry.max_retries = Some(max_retries);
        }
    }
}
