//! Remote mode against tracking servers that are down or hanging.

use runlog_telemetry::{
    Backend, BackendKind, LocalBackend, MetricSet, RetryPolicy, TagSet, TelemetryError,
    TelemetrySink, TrackingConfig,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Reserve a local port, then release it so nothing is listening there.
async fn unused_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Server that accepts connections, never answers, and counts what it accepted.
async fn hanging_server() -> (String, Arc<AtomicUsize>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(socket);
        }
    });
    (format!("http://{addr}"), accepted, server)
}

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        multiplier: 2.0,
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_reports_transport_error() {
    let config = TrackingConfig::remote(unused_address().await).with_run_id("run-1");
    let sink = TelemetrySink::from_config(config).unwrap();
    assert_eq!(sink.kind(), BackendKind::Remote);

    let err = sink.log_metrics(&MetricSet::from([("answer", 42.0)])).await.unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err}");

    // The job keeps going after a telemetry failure.
    let (local, output) = LocalBackend::capture();
    let fallback = TelemetrySink::new(Backend::Local(local));
    fallback.log_metrics(&MetricSet::from([("answer", 42.0)])).await.unwrap();
    assert_eq!(output.lines(), vec!["metric:answer=42"]);
}

#[tokio::test]
async fn test_unreachable_endpoint_without_run_fails_on_run_creation() {
    let sink = TelemetrySink::from_config(TrackingConfig::remote(unused_address().await)).unwrap();

    let err = sink.set_tags(&TagSet::from([("greeting", "Hello")])).await.unwrap_err();
    assert!(matches!(err, TelemetryError::RemoteTransport(_)));

    // Nothing was created, so closing has nothing to finish.
    sink.close().await.unwrap();
}

#[tokio::test]
async fn test_hanging_endpoint_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept connections and never answer.
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let timeout = Duration::from_millis(200);
    let config = TrackingConfig::remote(format!("http://{addr}"))
        .with_run_id("run-1")
        .with_timeout(timeout);
    let sink = TelemetrySink::from_config(config).unwrap();

    let started = Instant::now();
    let err = sink.log_metrics(&MetricSet::from([("loss", 0.5)])).await.unwrap_err();

    assert!(matches!(err, TelemetryError::Timeout(t) if t == timeout), "unexpected error: {err}");
    assert!(started.elapsed() < Duration::from_secs(5));
    server.abort();
}

#[tokio::test]
async fn test_timed_out_metrics_are_not_resent() {
    let (endpoint, accepted, server) = hanging_server().await;
    let config = TrackingConfig::remote(endpoint)
        .with_run_id("run-1")
        .with_timeout(Duration::from_millis(100))
        .with_retry(fast_retry(2));
    let sink = TelemetrySink::from_config(config).unwrap();

    let err = sink.log_metrics(&MetricSet::from([("loss", 0.5)])).await.unwrap_err();

    assert!(matches!(err, TelemetryError::Timeout(_)), "unexpected error: {err}");
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
    server.abort();
}

#[tokio::test]
async fn test_timed_out_tags_are_retried() {
    let (endpoint, accepted, server) = hanging_server().await;
    let config = TrackingConfig::remote(endpoint)
        .with_run_id("run-1")
        .with_timeout(Duration::from_millis(100))
        .with_retry(fast_retry(2));
    let sink = TelemetrySink::from_config(config).unwrap();

    let err = sink.set_tags(&TagSet::from([("greeting", "Hello")])).await.unwrap_err();

    assert!(matches!(err, TelemetryError::Timeout(_)), "unexpected error: {err}");
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
    server.abort();
}
