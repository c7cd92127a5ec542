//! MLflow tracking server adapter.
//!
//! Talks to the MLflow REST API (`/api/2.0/mlflow/...`):
//! - `runs/log-batch` for tags and metrics
//! - `runs/create` when no `MLFLOW_RUN_ID` was provided
//! - `runs/update` to mark a self-created run `FINISHED` on close
//!
//! MLflow stores metric values as doubles, so `MetricValue::Int` is converted to `f64`
//! here. Integers above 2^53 in magnitude lose precision at this boundary.
//!
//! `azureml://` tracking URIs, as set by the managed platform, are served over
//! `https://` at the same host and path.

use crate::client::RemoteTelemetryClient;
use crate::config::{RetryPolicy, TrackingAuth, TrackingConfig};
use crate::error::{TelemetryError, TelemetryResult};
use crate::types::{MetricSet, TagSet};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, warn};

const LOG_BATCH_PATH: &str = "/api/2.0/mlflow/runs/log-batch";
const CREATE_RUN_PATH: &str = "/api/2.0/mlflow/runs/create";
const UPDATE_RUN_PATH: &str = "/api/2.0/mlflow/runs/update";
const AZUREML_SCHEME: &str = "azureml";

/// MLflow implementation of `RemoteTelemetryClient`.
#[derive(Debug)]
pub struct MlflowClient {
    /// Tracking server base URL, without trailing slash.
    endpoint: String,
    client: Client,
    auth: TrackingAuth,
    experiment_id: String,
    /// Run provided by the platform (`MLFLOW_RUN_ID`).
    configured_run_id: Option<String>,
    /// Run resolved on first use.
    run: OnceCell<ResolvedRun>,
    /// Next step per metric key.
    steps: Mutex<HashMap<String, i64>>,
    finished: AtomicBool,
    timeout: Duration,
    retry: RetryPolicy,
}

#[derive(Debug)]
struct ResolvedRun {
    run_id: String,
    /// Created by this client, so this client is responsible for finishing it.
    owned: bool,
}

#[derive(Serialize)]
struct LogBatchRequest<'a> {
    run_id: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    metrics: Vec<MlflowMetric<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<MlflowTag<'a>>,
}

#[derive(Serialize)]
struct MlflowMetric<'a> {
    key: &'a str,
    value: f64,
    timestamp: i64,
    step: i64,
}

#[derive(Serialize)]
struct MlflowTag<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct CreateRunRequest<'a> {
    experiment_id: &'a str,
    start_time: i64,
}

#[derive(Deserialize)]
struct CreateRunResponse {
    run: RunPayload,
}

#[derive(Deserialize)]
struct RunPayload {
    info: RunInfo,
}

#[derive(Deserialize)]
struct RunInfo {
    run_id: String,
}

#[derive(Serialize)]
struct UpdateRunRequest<'a> {
    run_id: &'a str,
    status: &'a str,
    end_time: i64,
}

/// A failed request attempt and whether repeating it could help.
struct SendFailure {
    error: TelemetryError,
    retryable: bool,
}

/// Whether a request may be sent again after the server might already have applied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    /// Repeating the request leaves the server in the same state (tags, run update).
    Idempotent,
    /// Repeating the request could record it twice (metric points, run creation).
    AtMostOnce,
}

/// Resolve a tracking URI to the HTTP(S) base URL the REST API is served from.
///
/// # Errors
/// Returns `InvalidConfig` if the URI is unparsable or its scheme is not
/// `http`, `https` or `azureml`.
pub fn resolve_endpoint(raw: &str) -> TelemetryResult<String> {
    let url = Url::parse(raw).map_err(|e| {
        TelemetryError::InvalidConfig(format!("invalid tracking URI '{raw}': {e}"))
    })?;
    let resolved = match url.scheme() {
        "http" | "https" => raw.to_string(),
        AZUREML_SCHEME => match (url.host_str(), raw.find("://")) {
            (Some(_), Some(i)) => format!("https://{}", &raw[i + 3..]),
            _ => {
                return Err(TelemetryError::InvalidConfig(format!(
                    "tracking URI '{raw}' has no host"
                )));
            }
        },
        other => {
            return Err(TelemetryError::InvalidConfig(format!(
                "unsupported tracking URI scheme '{other}' (expected http, https or azureml)"
            )));
        }
    };
    Ok(resolved.trim_end_matches('/').to_string())
}

impl MlflowClient {
    /// Creates a client for the endpoint in `config`.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the endpoint is missing or `resolve_endpoint` rejects it.
    pub fn new(config: &TrackingConfig) -> TelemetryResult<Self> {
        let raw = config.endpoint.as_deref().ok_or_else(|| {
            TelemetryError::InvalidConfig("tracking endpoint is required for MLflow".to_string())
        })?;
        let endpoint = resolve_endpoint(raw)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TelemetryError::InvalidConfig(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            endpoint,
            client,
            auth: config.auth.clone(),
            experiment_id: config.experiment_id.clone(),
            configured_run_id: config.run_id.clone(),
            run: OnceCell::new(),
            steps: Mutex::new(HashMap::new()),
            finished: AtomicBool::new(false),
            timeout: config.timeout,
            retry: config.retry.clone(),
        })
    }

    /// Base URL requests are sent to, after `azureml://` resolution.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The run this client logs into, if one has been resolved yet.
    pub fn run_id(&self) -> Option<&str> {
        self.run.get().map(|run| run.run_id.as_str())
    }

    async fn resolve_run(&self) -> TelemetryResult<&ResolvedRun> {
        self.run
            .get_or_try_init(|| async {
                match &self.configured_run_id {
                    Some(run_id) => Ok(ResolvedRun { run_id: run_id.clone(), owned: false }),
                    None => self.create_run().await,
                }
            })
            .await
    }

    async fn create_run(&self) -> TelemetryResult<ResolvedRun> {
        let body = CreateRunRequest {
            experiment_id: &self.experiment_id,
            start_time: Utc::now().timestamp_millis(),
        };
        let text = self.post_json(CREATE_RUN_PATH, &body, Delivery::AtMostOnce).await?;
        let response: CreateRunResponse = serde_json::from_str(&text).map_err(|e| {
            error!(error = %e, "Failed to parse MLflow create-run response");
            TelemetryError::RemoteTransport(format!("malformed create-run response: {e}"))
        })?;

        debug!(
            run_id = %response.run.info.run_id,
            experiment_id = %self.experiment_id,
            "Created MLflow run"
        );
        Ok(ResolvedRun { run_id: response.run.info.run_id, owned: true })
    }

    /// Reserve the next step for each key in `metrics`.
    fn next_steps(&self, metrics: &MetricSet) -> Vec<i64> {
        let mut steps = match self.steps.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        metrics
            .iter()
            .map(|(key, _)| {
                let slot = steps.entry(key.to_string()).or_insert(0);
                let step = *slot;
                *slot += 1;
                step
            })
            .collect()
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        delivery: Delivery,
    ) -> TelemetryResult<String> {
        let url = format!("{}{}", self.endpoint, path);
        let mut retry_count = 0;
        loop {
            match self.send_once(&url, body, delivery).await {
                Ok(text) => return Ok(text),
                Err(failure) if failure.retryable && retry_count < self.retry.max_retries => {
                    let delay = self.retry.calculate_delay(retry_count);
                    warn!(
                        error = %failure.error,
                        retry = retry_count + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying MLflow request"
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    async fn send_once<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
        delivery: Delivery,
    ) -> Result<String, SendFailure> {
        let request = self.authorize(self.client.post(url).json(body));
        let response = request.send().await.map_err(|e| self.transport_failure(&e, delivery))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_failure(&e, delivery))?;
        if status.is_success() {
            return Ok(text);
        }

        error!(status = %status, error = %text, "MLflow API returned error status");
        let error = if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            TelemetryError::RemoteTransport(format!(
                "authentication rejected by {} ({status}): {text}",
                self.endpoint
            ))
        } else {
            TelemetryError::RemoteTransport(format!("API error ({status}): {text}"))
        };
        Err(SendFailure { error, retryable: status.is_server_error() })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            TrackingAuth::None => request,
            TrackingAuth::Bearer(token) => request.bearer_auth(token),
            TrackingAuth::Basic { username, password } => request.basic_auth(username, password.as_ref()),
        }
    }

    /// Map a reqwest error. Only a failed connect proves the request never reached the
    /// server, so other failures are retried for idempotent requests only.
    fn transport_failure(&self, e: &reqwest::Error, delivery: Delivery) -> SendFailure {
        error!(error = %e, endpoint = %self.endpoint, "MLflow request failed");
        let error = if e.is_timeout() {
            TelemetryError::Timeout(self.timeout)
        } else if e.is_connect() {
            TelemetryError::RemoteTransport(format!(
                "tracking server not reachable at {}: {e}",
                self.endpoint
            ))
        } else {
            TelemetryError::RemoteTransport(format!("Network error: {e}"))
        };
        let retryable = e.is_connect() || delivery == Delivery::Idempotent;
        SendFailure { error, retryable }
    }
}

#[async_trait]
impl RemoteTelemetryClient for MlflowClient {
    fn id(&self) -> &'static str {
        "mlflow"
    }

    async fn set_tags(&self, tags: &TagSet) -> TelemetryResult<()> {
        if tags.is_empty() {
            return Ok(());
        }
        let run = self.resolve_run().await?;
        let body = LogBatchRequest {
            run_id: &run.run_id,
            metrics: Vec::new(),
            tags: tags.iter().map(|(key, value)| MlflowTag { key, value }).collect(),
        };
        debug!(run_id = %run.run_id, count = tags.len(), "Logging tags to MLflow");
        self.post_json(LOG_BATCH_PATH, &body, Delivery::Idempotent).await?;
        Ok(())
    }

    async fn log_metrics(&self, metrics: &MetricSet) -> TelemetryResult<()> {
        if metrics.is_empty() {
            return Ok(());
        }
        let run = self.resolve_run().await?;
        let timestamp = Utc::now().timestamp_millis();
        let steps = self.next_steps(metrics);
        let body = LogBatchRequest {
            run_id: &run.run_id,
            metrics: metrics
                .iter()
                .zip(steps)
                .map(|((key, value), step)| MlflowMetric { key, value: value.as_f64(), timestamp, step })
                .collect(),
            tags: Vec::new(),
        };
        debug!(run_id = %run.run_id, count = metrics.len(), "Logging metrics to MLflow");
        self.post_json(LOG_BATCH_PATH, &body, Delivery::AtMostOnce).await?;
        Ok(())
    }

    async fn finish(&self) -> TelemetryResult<()> {
        let Some(run) = self.run.get() else {
            return Ok(());
        };
        // Sinks sharing this client finish the run once.
        if !run.owned || self.finished.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let body = UpdateRunRequest {
            run_id: &run.run_id,
            status: "FINISHED",
            end_time: Utc::now().timestamp_millis(),
        };
        debug!(run_id = %run.run_id, "Finishing MLflow run");
        self.post_json(UPDATE_RUN_PATH, &body, Delivery::Idempotent).await?;
        Ok(())
    }
}
