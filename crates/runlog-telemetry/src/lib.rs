//! Runlog Telemetry
//!
//! Tag and metric logging for training jobs that behaves the same inside the
//! managed platform and on a developer machine:
//! - `TelemetrySink` is the single entry point (`set_tags`, `log_metrics`, `close`)
//! - Remote mode forwards batches to an MLflow tracking server (`MlflowClient`)
//! - Local mode writes `tag:<key>=<value>` / `metric:<key>=<value>` lines to stderr
//!
//! Backend selection happens once, at construction. `TelemetrySink::from_env` is the
//! only place that reads the process environment (`MLFLOW_TRACKING_URI`).
//!
//! ```no_run
//! use runlog_telemetry::{MetricSet, TagSet, TelemetrySink};
//!
//! # async fn example() -> runlog_telemetry::TelemetryResult<()> {
//! let sink = TelemetrySink::from_env()?;
//! sink.set_tags(&TagSet::from([("greeting", "Hello")])).await?;
//! sink.log_metrics(&MetricSet::from([("answer", 42.0)])).await?;
//! sink.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod local;
pub mod mlflow;
pub mod sink;
pub mod tracking;
pub mod types;

pub use client::RemoteTelemetryClient;
pub use config::{RetryPolicy, TrackingAuth, TrackingConfig, TRACKING_URI_ENV};
pub use error::{TelemetryError, TelemetryResult};
pub use local::{CaptureBuffer, LocalBackend};
pub use mlflow::MlflowClient;
pub use sink::{Backend, TelemetrySink};
pub use tracking::InitOutcome;
pub use types::{BackendKind, MetricSet, MetricValue, TagSet};
