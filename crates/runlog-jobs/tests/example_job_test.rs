use runlog_jobs::example::{HELLO_FILE_CONTENTS, VALUE_SERIES};
use runlog_jobs::{run_example, ExampleArgs};
use runlog_telemetry::{Backend, LocalBackend, TelemetrySink, TrackingConfig};
use tempfile::TempDir;

fn args_in(temp: &TempDir) -> ExampleArgs {
    ExampleArgs::new(temp.path().join("data"), "Hello", temp.path().join("outputs"))
}

#[tokio::test]
async fn test_example_logs_tags_and_metric_series_locally() {
    let temp = TempDir::new().unwrap();
    let (local, output) = LocalBackend::capture();
    let sink = TelemetrySink::new(Backend::Local(local));

    let outcome = run_example(&args_in(&temp), &sink).await.unwrap();

    let lines = output.lines();
    assert_eq!(lines[0], "tag:greeting=Hello");
    assert_eq!(lines[1], "metric:answer=42");
    let values: Vec<_> = lines[2..].to_vec();
    assert_eq!(
        values,
        vec![
            "metric:value=1",
            "metric:value=0",
            "metric:value=1",
            "metric:value=2",
            "metric:value=3",
            "metric:value=2",
            "metric:value=4",
        ]
    );
    assert_eq!(values.len(), VALUE_SERIES.len());

    assert_eq!(outcome.telemetry_failures, 0);
    assert_eq!(std::fs::read_to_string(&outcome.output_file).unwrap(), HELLO_FILE_CONTENTS);
}

#[tokio::test]
async fn test_example_survives_unreachable_tracking_server() {
    let temp = TempDir::new().unwrap();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = TrackingConfig::remote(format!("http://{addr}")).with_run_id("run-1");
    let sink = TelemetrySink::from_config(config).unwrap();

    let outcome = run_example(&args_in(&temp), &sink).await.unwrap();

    // One tag batch, the answer, and every point of the value series.
    assert_eq!(outcome.telemetry_failures, 2 + VALUE_SERIES.len());
    assert!(outcome.output_file.exists());
}

#[tokio::test]
async fn test_example_lists_existing_data_dir() {
    let temp = TempDir::new().unwrap();
    let args = args_in(&temp);
    std::fs::create_dir_all(&args.data_path).unwrap();
    std::fs::write(args.data_path.join("train.csv"), "a,b\n1,2\n").unwrap();
    std::fs::create_dir(args.data_path.join("images")).unwrap();

    let (local, _output) = LocalBackend::capture();
    let sink = TelemetrySink::new(Backend::Local(local));

    let outcome = run_example(&args, &sink).await.unwrap();
    assert_eq!(outcome.data_entries, vec!["images".to_string(), "train.csv".to_string()]);
    assert!(outcome.output_file.ends_with("hello.txt"));
}

#[tokio::test]
async fn test_example_missing_data_dir_lists_nothing() {
    let temp = TempDir::new().unwrap();
    let (local, _output) = LocalBackend::capture();
    let sink = TelemetrySink::new(Backend::Local(local));

    let outcome = run_example(&args_in(&temp), &sink).await.unwrap();
    assert!(outcome.data_entries.is_empty());
}
