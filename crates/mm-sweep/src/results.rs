use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::SweepError;

/// The CSV every trial appends to.
///
/// The driver never writes rows itself; the runner appends them. Its only
/// job is the fresh-start policy in [`ResultsFile::prepare`].
#[derive(Debug, Clone)]
pub struct ResultsFile {
    path: PathBuf,
}

impl ResultsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the parent directory and deletes any stale results file.
    pub fn prepare(&self) -> Result<(), SweepError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| SweepError::Setup {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "removed stale results file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SweepError::Setup {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
