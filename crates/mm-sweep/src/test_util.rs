use std::path::PathBuf;

use crate::runner::{Invocation, RunnerError, TrialRunner};

/// In-memory [`TrialRunner`] that records every invocation.
///
/// Can be told to fail at a given call and to note, at each call, whether a
/// file (normally the results file) exists.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub calls: Vec<Invocation>,
    pub fail_at: Option<usize>,
    pub watch: Option<PathBuf>,
    pub watched_exists: Vec<bool>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the call with this zero-based index.
    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }

    pub fn watching(mut self, path: impl Into<PathBuf>) -> Self {
        self.watch = Some(path.into());
        self
    }
}

impl TrialRunner for RecordingRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<(), RunnerError> {
        let idx = self.calls.len();
        self.calls.push(invocation.clone());
        if let Some(path) = &self.watch {
            self.watched_exists.push(path.exists());
        }
        if self.fail_at == Some(idx) {
            return Err(RunnerError::Other(format!("injected failure at call {idx}")));
        }
        Ok(())
    }
}
