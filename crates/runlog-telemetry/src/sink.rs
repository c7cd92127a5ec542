//! The tag/metric logging entry point.

use crate::client::RemoteTelemetryClient;
use crate::config::TrackingConfig;
use crate::error::{TelemetryError, TelemetryResult};
use crate::local::LocalBackend;
use crate::mlflow::MlflowClient;
use crate::tracking;
use crate::types::{BackendKind, MetricSet, TagSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// The backend a sink is bound to for its whole lifetime.
pub enum Backend {
    Remote(Arc<dyn RemoteTelemetryClient>),
    Local(LocalBackend),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Remote(_) => BackendKind::Remote,
            Self::Local(_) => BackendKind::Local,
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(client) => f.debug_tuple("Remote").field(&client.id()).finish(),
            Self::Local(local) => f.debug_tuple("Local").field(local).finish(),
        }
    }
}

/// Uniform tag/metric logging regardless of where the job runs.
///
/// The backend is chosen once at construction and never re-evaluated. The sink is
/// `Send + Sync`; share it behind an `Arc` to log from several tasks.
#[derive(Debug)]
pub struct TelemetrySink {
    backend: Backend,
    closed: AtomicBool,
}

impl TelemetrySink {
    pub fn new(backend: Backend) -> Self {
        info!(backend = %backend.kind(), "Telemetry sink bound");
        Self { backend, closed: AtomicBool::new(false) }
    }

    /// Sink writing `tag:`/`metric:` lines to stderr.
    pub fn local() -> Self {
        Self::new(Backend::Local(LocalBackend::stderr()))
    }

    /// Build a sink from the process environment.
    ///
    /// A missing `MLFLOW_TRACKING_URI` selects the local backend and is not an error.
    pub fn from_env() -> TelemetryResult<Self> {
        Self::init_from(TrackingConfig::from_env())
    }

    /// Bind the sink to the process-wide tracking client for the configured endpoint.
    ///
    /// Safe to call repeatedly with the same endpoint: every sink shares one client,
    /// and with it one run. An endpoint the sink cannot use is rejected before it is
    /// registered.
    pub fn init_from(config: TrackingConfig) -> TelemetryResult<Self> {
        if config.is_remote() {
            let (client, _) = tracking::init(&config)?;
            Ok(Self::new(Backend::Remote(client)))
        } else {
            debug!("No tracking endpoint configured, using local telemetry");
            Ok(Self::local())
        }
    }

    /// Bind a sink from an explicit configuration without touching process-wide state.
    ///
    /// Each call builds its own client; use `init_from` to share one per process.
    pub fn from_config(config: TrackingConfig) -> TelemetryResult<Self> {
        if config.is_remote() {
            let client = MlflowClient::new(&config)?;
            Ok(Self::new(Backend::Remote(Arc::new(client))))
        } else {
            debug!("No tracking endpoint configured, using local telemetry");
            Ok(Self::local())
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Record run tags. Empty sets are a no-op.
    pub async fn set_tags(&self, tags: &TagSet) -> TelemetryResult<()> {
        self.ensure_open()?;
        if tags.is_empty() {
            return Ok(());
        }

        match &self.backend {
            Backend::Remote(client) => client.set_tags(tags).await.inspect_err(|e| {
                warn!(client = client.id(), error = %e, count = tags.len(), "Failed to set remote tags");
            }),
            Backend::Local(local) => local.write_tags(tags),
        }
    }

    /// Record one observation per metric key.
    ///
    /// Non-finite values reject the whole set before anything reaches the backend.
    pub async fn log_metrics(&self, metrics: &MetricSet) -> TelemetryResult<()> {
        self.ensure_open()?;
        metrics.validate()?;
        if metrics.is_empty() {
            return Ok(());
        }

        match &self.backend {
            Backend::Remote(client) => client.log_metrics(metrics).await.inspect_err(|e| {
                warn!(client = client.id(), error = %e, count = metrics.len(), "Failed to log remote metrics");
            }),
            Backend::Local(local) => local.write_metrics(metrics),
        }
    }

    /// Finish the run (remote) or flush the stream (local).
    ///
    /// Only the first call does any work. Later `set_tags`/`log_metrics` calls fail
    /// with `TelemetryError::Closed`.
    pub async fn close(&self) -> TelemetryResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!(backend = %self.kind(), "Closing telemetry sink");
        match &self.backend {
            Backend::Remote(client) => client.finish().await,
            Backend::Local(local) => local.flush(),
        }
    }

    fn ensure_open(&self) -> TelemetryResult<()> {
        if self.is_closed() { Err(TelemetryError::Closed) } else { Ok(()) }
    }
}
