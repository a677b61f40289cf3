use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::runner::RunnerError;

// ── Errors ──────────────────────────────────────────────────────────

/// Everything that can stop a sweep. All variants are fatal.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("invalid sweep config: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to prepare {}: {source}", .path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("trial {index}/{total} ({trial}) failed: {source}")]
    Trial {
        index: usize,
        total: usize,
        trial: String,
        #[source]
        source: RunnerError,
    },
    #[error("sweep interrupted after {completed} of {total} trials")]
    Interrupted { completed: usize, total: usize },
}
