use std::path::PathBuf;
use thiserror::Error;

pub type JobResult<T> = std::result::Result<T, JobError>;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid job arguments: {0}")]
    InvalidArgs(String),

    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
