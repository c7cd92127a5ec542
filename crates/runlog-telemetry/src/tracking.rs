//! Process-wide registration of the tracking client.
//!
//! The first remote configuration builds the `MlflowClient` every later sink in the
//! process shares, so the run is created once and step counters keep counting.
//! Registering the same endpoint again is a no-op.

use crate::config::TrackingConfig;
use crate::error::{TelemetryError, TelemetryResult};
use crate::mlflow::{MlflowClient, resolve_endpoint};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, info};

static TRACKING_CLIENT: OnceCell<Arc<MlflowClient>> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// This call registered the endpoint.
    Registered,
    /// The same endpoint was already registered by an earlier call.
    AlreadyRegistered,
}

/// Register the endpoint in `config` and return the process-wide client for it.
///
/// Only the first successful call builds a client; its run id, auth and timeout
/// settings are the ones every sink uses. An endpoint that cannot be used is
/// rejected without being registered.
///
/// # Errors
/// `InvalidConfig` for a missing or unusable endpoint, `EndpointConflict` if a
/// different endpoint is already registered.
pub fn init(config: &TrackingConfig) -> TelemetryResult<(Arc<MlflowClient>, InitOutcome)> {
    let mut registered_now = false;
    let client = TRACKING_CLIENT.get_or_try_init(|| {
        let client = MlflowClient::new(config)?;
        registered_now = true;
        Ok::<_, TelemetryError>(Arc::new(client))
    })?;

    if registered_now {
        info!(endpoint = %client.endpoint(), "Registered tracking endpoint");
        return Ok((Arc::clone(client), InitOutcome::Registered));
    }

    let requested = config.endpoint.as_deref().ok_or_else(|| {
        TelemetryError::InvalidConfig("tracking endpoint is required for MLflow".to_string())
    })?;
    let requested = resolve_endpoint(requested)?;
    if requested == client.endpoint() {
        debug!(endpoint = %requested, "Tracking endpoint already registered");
        Ok((Arc::clone(client), InitOutcome::AlreadyRegistered))
    } else {
        Err(TelemetryError::EndpointConflict {
            registered: client.endpoint().to_string(),
            requested,
        })
    }
}

/// The endpoint registered by `init`, if any.
pub fn registered_endpoint() -> Option<&'static str> {
    TRACKING_CLIENT.get().map(|client| client.endpoint())
}
