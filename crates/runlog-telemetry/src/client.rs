use crate::error::TelemetryResult;
use crate::types::{MetricSet, TagSet};
use async_trait::async_trait;

/// Narrow boundary to a remote tracking service.
///
/// Implementations receive whole batches. Callers never pass empty sets or
/// non-finite metric values; `TelemetrySink` filters both before dispatch.
#[async_trait]
pub trait RemoteTelemetryClient: Send + Sync {
    fn id(&self) -> &'static str;

    /// Record all tags in a single call.
    async fn set_tags(&self, tags: &TagSet) -> TelemetryResult<()>;

    /// Record one new time-series point per key.
    async fn log_metrics(&self, metrics: &MetricSet) -> TelemetryResult<()>;

    /// Finalize the run. Called at most once, from `TelemetrySink::close`.
    async fn finish(&self) -> TelemetryResult<()> {
        Ok(())
    }
}
