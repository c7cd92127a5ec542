//! Runlog Jobs
//!
//! Job steps for the managed training platform. Every step is a plain function;
//! steps that report progress take a `TelemetrySink` instead of building their own.
//! - `run_example`: greets, tags the run, logs metrics and writes `hello.txt`
//! - `write_step` / `read_step`: hand a file between pipeline steps

pub mod error;
pub mod example;
pub mod layout;
pub mod steps;

pub use error::{JobError, JobResult};
pub use example::{get_the_ultimate_answer, run_example, ExampleArgs, ExampleOutcome};
pub use layout::StepLayout;
pub use steps::{read_step, write_step};
