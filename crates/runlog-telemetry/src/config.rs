//! Tracking configuration resolved from the process environment.
//!
//! `MLFLOW_TRACKING_URI` is the only variable that decides the backend. The rest are
//! consulted by the MLflow adapter once remote mode has been selected.

use std::fmt;
use std::time::Duration;

/// Set by the managed platform when a job runs inside it.
pub const TRACKING_URI_ENV: &str = "MLFLOW_TRACKING_URI";
/// Run to attach tags and metrics to. When unset, a run is created on first use.
pub const RUN_ID_ENV: &str = "MLFLOW_RUN_ID";
pub const EXPERIMENT_ID_ENV: &str = "MLFLOW_EXPERIMENT_ID";
pub const TRACKING_TOKEN_ENV: &str = "MLFLOW_TRACKING_TOKEN";
pub const TRACKING_USERNAME_ENV: &str = "MLFLOW_TRACKING_USERNAME";
pub const TRACKING_PASSWORD_ENV: &str = "MLFLOW_TRACKING_PASSWORD";

pub const DEFAULT_EXPERIMENT_ID: &str = "0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Retry policy for remote transport failures.
///
/// Connect failures and 5xx responses are retried for every request. Timeouts and
/// dropped connections are retried for tag batches and run updates only: a metric
/// batch or run creation the server may already have applied is not sent twice.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries (0 = no retries).
    pub max_retries: u32,
    /// Initial delay before first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier (e.g., 2.0 for exponential backoff).
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_retries` retries and the default delays.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self { max_retries, ..Self::default() }
    }

    /// Calculate the delay for a given retry attempt.
    ///
    /// Uses exponential backoff: initial_delay * multiplier^retry_count, capped at max_delay.
    pub fn calculate_delay(&self, retry_count: u32) -> Duration {
        let delay_ms = (self.initial_delay.as_millis() as f64
            * self.multiplier.powi(retry_count as i32))
        .min(self.max_delay.as_millis() as f64) as u64;
        Duration::from_millis(delay_ms)
    }
}

/// Credentials sent to the tracking server.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum TrackingAuth {
    #[default]
    None,
    Bearer(String),
    Basic { username: String, password: Option<String> },
}

impl fmt::Debug for TrackingAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bearer(_) => f.write_str("Bearer(***)"),
            Self::Basic { username, .. } => write!(f, "Basic({username}, ***)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Tracking server URI. `None` selects the local backend.
    pub endpoint: Option<String>,
    pub run_id: Option<String>,
    pub experiment_id: String,
    pub auth: TrackingAuth,
    /// Upper bound for a single remote request.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            run_id: None,
            experiment_id: DEFAULT_EXPERIMENT_ID.to_string(),
            auth: TrackingAuth::None,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl TrackingConfig {
    /// Configuration that binds the local backend.
    #[must_use]
    pub fn local() -> Self {
        Self::default()
    }

    /// Configuration that binds the remote backend to `endpoint`.
    #[must_use]
    pub fn remote(endpoint: impl Into<String>) -> Self {
        Self { endpoint: normalize_endpoint(&endpoint.into()), ..Self::default() }
    }

    /// Read the configuration from the process environment.
    #[allow(clippy::disallowed_methods)] // env::var is the one sanctioned read of tracking config
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Empty or whitespace-only values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        };

        let auth = if let Some(token) = get(TRACKING_TOKEN_ENV) {
            TrackingAuth::Bearer(token)
        } else if let Some(username) = get(TRACKING_USERNAME_ENV) {
            TrackingAuth::Basic { username, password: get(TRACKING_PASSWORD_ENV) }
        } else {
            TrackingAuth::None
        };

        Self {
            endpoint: get(TRACKING_URI_ENV).and_then(|uri| normalize_endpoint(&uri)),
            run_id: get(RUN_ID_ENV),
            experiment_id: get(EXPERIMENT_ID_ENV)
                .unwrap_or_else(|| DEFAULT_EXPERIMENT_ID.to_string()),
            auth,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    #[must_use]
    pub fn with_auth(mut self, auth: TrackingAuth) -> Self {
        self.auth = auth;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_remote(&self) -> bool {
        self.endpoint.is_some()
    }
}

fn normalize_endpoint(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}
