//! The example job: the minimum a training job needs to get started on the platform.

use crate::error::{JobError, JobResult};
use runlog_telemetry::{MetricSet, TagSet, TelemetryResult, TelemetrySink};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const HELLO_FILE_NAME: &str = "hello.txt";
pub const HELLO_FILE_CONTENTS: &str = "Hello darkness, my old friend!";

/// Logged as separate observations of the `value` metric.
pub const VALUE_SERIES: [f64; 7] = [1.0, 0.0, 1.0, 2.0, 3.0, 2.0, 4.0];

#[must_use]
pub fn get_the_ultimate_answer() -> f64 {
    42.0
}

#[derive(Debug, Clone)]
pub struct ExampleArgs {
    /// Where the job's input data is mounted.
    pub data_path: PathBuf,
    /// Word with which to greet the world.
    pub greeting: String,
    /// Where `hello.txt` is written. The platform collects `../outputs` when the job
    /// runs from `src/`.
    pub outputs_dir: PathBuf,
}

impl ExampleArgs {
    #[must_use]
    pub fn new(data_path: PathBuf, greeting: impl Into<String>, outputs_dir: PathBuf) -> Self {
        Self { data_path, greeting: greeting.into(), outputs_dir }
    }

    /// Arguments used when the job is launched without any, e.g. from a debugger.
    ///
    /// Run from `src/`, outputs land where the platform would put them (`../outputs`);
    /// run from the repo root, they stay at `./outputs`.
    #[must_use]
    pub fn debug_defaults(cwd: &Path) -> Self {
        let outputs_dir = if cwd.file_name().is_some_and(|name| name == "src") {
            PathBuf::from("../outputs")
        } else {
            PathBuf::from("./outputs")
        };
        Self::new(PathBuf::from("path/to/data"), "Hello", outputs_dir)
    }

    pub fn validate(&self) -> JobResult<()> {
        if self.greeting.trim().is_empty() {
            return Err(JobError::InvalidArgs("greeting must not be empty".to_string()));
        }
        if self.outputs_dir.as_os_str().is_empty() {
            return Err(JobError::InvalidArgs("outputs_dir is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleOutcome {
    pub output_file: PathBuf,
    /// Entries of `data_path` listed on stderr, sorted. Empty if it is not a directory.
    pub data_entries: Vec<String>,
    /// Telemetry calls that failed. They never fail the job.
    pub telemetry_failures: usize,
}

/// Run the example job.
///
/// Telemetry failures are logged and counted; only I/O on the job's own outputs
/// fails the step.
pub async fn run_example(args: &ExampleArgs, sink: &TelemetrySink) -> JobResult<ExampleOutcome> {
    args.validate()?;
    let mut telemetry_failures = 0;

    // Inputs as tags, so the run records what produced it.
    let tags = TagSet::from([("greeting", args.greeting.as_str())]);
    telemetry_failures += report(sink.set_tags(&tags).await, "set_tags");

    println!("{} world!", args.greeting);
    eprintln!("'data_path' is pointing to '{}'", args.data_path.display());
    let data_entries =
        if args.data_path.is_dir() { list_dir(&args.data_path)? } else { Vec::new() };
    for entry in &data_entries {
        eprintln!("  {entry}");
    }

    let answer = MetricSet::from([("answer", get_the_ultimate_answer())]);
    telemetry_failures += report(sink.log_metrics(&answer).await, "log_metrics");

    for value in VALUE_SERIES {
        let metrics = MetricSet::from([("value", value)]);
        telemetry_failures += report(sink.log_metrics(&metrics).await, "log_metrics");
    }

    std::fs::create_dir_all(&args.outputs_dir)?;
    let output_file = args.outputs_dir.join(HELLO_FILE_NAME);
    std::fs::write(&output_file, HELLO_FILE_CONTENTS)?;

    Ok(ExampleOutcome { output_file, data_entries, telemetry_failures })
}

fn report(result: TelemetryResult<()>, operation: &'static str) -> usize {
    match result {
        Ok(()) => 0,
        Err(e) => {
            warn!(operation, error = %e, "Telemetry call failed, continuing");
            1
        }
    }
}

fn list_dir(dir: &Path) -> JobResult<Vec<String>> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    Ok(entries)
}
