use std::time::Duration;
use thiserror::Error;

pub type TelemetryResult<T> = std::result::Result<T, TelemetryError>;

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The tracking server is configured but unreachable, or rejected the call.
    #[error("remote transport error: {0}")]
    RemoteTransport(String),

    #[error("remote tracking call timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid metric value for '{key}': {value} is not a finite number")]
    InvalidMetricValue { key: String, value: f64 },

    #[error("failed to write local telemetry: {0}")]
    LocalWrite(#[from] std::io::Error),

    #[error("invalid tracking configuration: {0}")]
    InvalidConfig(String),

    #[error("tracking endpoint already initialized to '{registered}', refusing '{requested}'")]
    EndpointConflict { registered: String, requested: String },

    #[error("telemetry sink is closed")]
    Closed,
}

impl TelemetryError {
    /// Whether the error came from talking to the remote tracking server.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::RemoteTransport(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(TelemetryError::RemoteTransport("down".to_string()).is_transport());
        assert!(TelemetryError::Timeout(Duration::from_secs(5)).is_transport());
        assert!(!TelemetryError::Closed.is_transport());
        assert!(!TelemetryError::InvalidMetricValue { key: "loss".to_string(), value: f64::NAN }
            .is_transport());
    }
}
