//! Telemetry sink construction for commands.

use crate::config::CliConfig;
use anyhow::{Context, Result};
use runlog_telemetry::{RetryPolicy, TelemetrySink, TrackingConfig};
use std::time::Duration;
use tracing::{debug, warn};

/// Build the sink from the environment plus config overrides.
///
/// A configured tracking endpoint always binds the remote backend. One that cannot be
/// used is a configuration error, reported before the job starts.
pub fn build_sink(config: &CliConfig) -> Result<TelemetrySink> {
    let mut tracking = TrackingConfig::from_env();
    if let Some(timeout_secs) = config.telemetry.timeout_secs {
        tracking = tracking.with_timeout(Duration::from_secs(timeout_secs));
    }
    if let Some(max_retries) = config.telemetry.max_retries {
        tracking = tracking.with_retry(RetryPolicy::with_max_retries(max_retries));
    }

    let endpoint = tracking.endpoint.clone();
    let sink = TelemetrySink::init_from(tracking).with_context(|| {
        format!("Cannot log to tracking endpoint {}", endpoint.as_deref().unwrap_or("(local)"))
    })?;
    debug!(backend = %sink.kind(), "Telemetry backend selected");
    Ok(sink)
}

pub async fn close_sink(sink: &TelemetrySink) {
    if let Err(e) = sink.close().await {
        warn!(error = %e, "Failed to close telemetry sink");
    }
}
