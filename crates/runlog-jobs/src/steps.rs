use crate::error::{JobError, JobResult};
use crate::layout::StepLayout;
use std::path::PathBuf;
use tracing::debug;

/// Write `content` to `file.txt` under the layout's data path.
pub fn write_step(content: &str, layout: &StepLayout) -> JobResult<PathBuf> {
    layout.ensure_dirs()?;
    let file = layout.shared_file();
    std::fs::write(&file, content)?;
    debug!(path = %file.display(), bytes = content.len(), "Wrote step output");
    Ok(file)
}

/// Read `file.txt` from the layout's data path.
pub fn read_step(layout: &StepLayout) -> JobResult<String> {
    let file = layout.shared_file();
    match std::fs::read_to_string(&file) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(JobError::MissingInput(file)),
        Err(e) => Err(e.into()),
    }
}
