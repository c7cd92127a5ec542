//! One-time tracking endpoint registration.
//!
//! All tests in this binary share the process-wide registry, so they all use
//! the same endpoint and only assert on outcomes that hold in any test order.
//! Tests that need a different or empty registry live in their own binaries.

use runlog_telemetry::{
    tracking, BackendKind, InitOutcome, TelemetryError, TelemetrySink, TrackingConfig,
};
use std::sync::Arc;

const ENDPOINT: &str = "http://127.0.0.1:5000";

#[test]
fn test_init_twice_with_same_endpoint_is_noop() {
    let (first_client, first) = tracking::init(&TrackingConfig::remote(ENDPOINT)).unwrap();
    let (second_client, second) = tracking::init(&TrackingConfig::remote(ENDPOINT)).unwrap();

    assert!(matches!(first, InitOutcome::Registered | InitOutcome::AlreadyRegistered));
    assert_eq!(second, InitOutcome::AlreadyRegistered);
    assert!(Arc::ptr_eq(&first_client, &second_client));
    assert_eq!(tracking::registered_endpoint(), Some(ENDPOINT));
}

#[test]
fn test_init_with_different_endpoint_conflicts() {
    tracking::init(&TrackingConfig::remote(ENDPOINT)).unwrap();

    match tracking::init(&TrackingConfig::remote("http://10.0.0.1:5000")) {
        Err(TelemetryError::EndpointConflict { registered, requested }) => {
            assert_eq!(registered, ENDPOINT);
            assert_eq!(requested, "http://10.0.0.1:5000");
        }
        other => panic!("expected EndpointConflict, got {other:?}"),
    }
}

#[test]
fn test_constructing_sink_twice_reuses_registration() {
    let first = TelemetrySink::init_from(TrackingConfig::remote(ENDPOINT)).unwrap();
    let second = TelemetrySink::init_from(TrackingConfig::remote(format!("{ENDPOINT}/"))).unwrap();

    assert_eq!(first.kind(), BackendKind::Remote);
    assert_eq!(second.kind(), BackendKind::Remote);
    assert_eq!(tracking::registered_endpoint(), Some(ENDPOINT));
}

#[test]
fn test_unusable_endpoint_is_not_registered() {
    let err = TelemetrySink::init_from(TrackingConfig::remote("file:///tmp/mlruns")).unwrap_err();
    assert!(matches!(err, TelemetryError::InvalidConfig(_)));
    assert_ne!(tracking::registered_endpoint(), Some("file:///tmp/mlruns"));
}
