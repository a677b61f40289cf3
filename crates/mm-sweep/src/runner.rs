//! Benchmark runner seam.
//!
//! The driver only builds [`Invocation`]s; a [`TrialRunner`] executes them.
//! [`ProcessRunner`] spawns the real benchmark as a child process.

use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus};

use thiserror::Error;

use crate::axis::Trial;
use crate::config::{RunnerConfig, CC_AXIS};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}")]
    Failed { command: String, status: ExitStatus },
    /// Non-process failure, used by in-memory runners.
    #[error("{0}")]
    Other(String),
}

/// A fully materialized benchmark command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Command line for one trial.
    ///
    /// Order: runner base args, one `flag value` pair per axis, uplink and
    /// downlink traces, output path, then `passthrough` verbatim.
    /// Congestion-control names are lower-cased. Paths are expected to be
    /// UTF-8, which [`SweepConfig::validate`] enforces.
    ///
    /// [`SweepConfig::validate`]: crate::config::SweepConfig::validate
    pub fn for_trial(
        runner: &RunnerConfig,
        trial: &Trial,
        uplink: &Path,
        downlink: &Path,
        output: &Path,
        passthrough: &[String],
    ) -> Self {
        let mut args = runner.args.clone();
        for a in &trial.assignments {
            args.push(a.flag.clone());
            if a.axis == CC_AXIS {
                args.push(a.value.to_string().to_lowercase());
            } else {
                args.push(a.value.to_string());
            }
        }
        args.push(runner.trace_uplink_flag.clone());
        args.push(uplink.display().to_string());
        args.push(runner.trace_downlink_flag.clone());
        args.push(downlink.display().to_string());
        args.push(runner.output_flag.clone());
        args.push(output.display().to_string());
        args.extend(passthrough.iter().cloned());

        Self {
            program: runner.program.clone(),
            args,
        }
    }

    /// Value following `flag`, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_word(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_word(arg))?;
        }
        Ok(())
    }
}

fn shell_word(s: &str) -> String {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Executes one trial, blocking until it finishes.
pub trait TrialRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<(), RunnerError>;
}

/// Runs each invocation as a child process with inherited stdio.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl TrialRunner for ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<(), RunnerError> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|source| RunnerError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(RunnerError::Failed {
                command: invocation.to_string(),
                status,
            });
        }
        Ok(())
    }
}
