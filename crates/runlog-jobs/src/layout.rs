use crate::error::JobResult;
use std::path::{Path, PathBuf};

/// File layout shared by the writer and reader steps.
///
/// Default layout for local runs is `<repo_root>/data/outputs/file.txt`.
#[derive(Debug, Clone)]
pub struct StepLayout {
    data_path: PathBuf,
}

impl StepLayout {
    #[must_use]
    pub fn new(data_path: PathBuf) -> Self {
        Self { data_path }
    }

    /// Layout used when a step runs from a checkout without explicit arguments.
    #[must_use]
    pub fn for_repo_root(repo_root: &Path) -> Self {
        Self::new(repo_root.join("data").join("outputs"))
    }

    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    #[must_use]
    pub fn shared_file(&self) -> PathBuf {
        self.data_path.join("file.txt")
    }

    pub fn ensure_dirs(&self) -> JobResult<()> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }
}
