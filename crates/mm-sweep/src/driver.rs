//! The experiment driver: one linear, fail-fast pass over the sweep.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::axis::{self, Trial};
use crate::config::{SweepConfig, TraceSource};
use crate::error::SweepError;
use crate::results::ResultsFile;
use crate::runner::{Invocation, TrialRunner};
use crate::trace;

/// Outcome of a sweep where every trial succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepReport {
    pub trials: usize,
    pub elapsed: Duration,
}

/// Runs every combination of the configured axes, in order, one at a time.
pub struct SweepDriver<'a> {
    config: &'a SweepConfig,
    passthrough: Vec<String>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> SweepDriver<'a> {
    pub fn new(config: &'a SweepConfig) -> Self {
        Self {
            config,
            passthrough: Vec::new(),
            cancel: None,
        }
    }

    /// Extra arguments appended verbatim to every runner invocation.
    pub fn passthrough(mut self, args: Vec<String>) -> Self {
        self.passthrough = args;
        self
    }

    /// Flag checked between trials; once set the sweep stops.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Every invocation the sweep would make, in order. No side effects.
    pub fn plan(&self) -> Vec<Invocation> {
        let (uplink, downlink) = self.trace_paths();
        axis::trials(&self.config.axes)
            .iter()
            .map(|trial| self.invocation(trial, &uplink, &downlink))
            .collect()
    }

    /// Prepares the results file and traces, then runs each trial.
    ///
    /// Stops at the first runner error; later trials never start.
    pub fn run<R: TrialRunner>(&self, runner: &mut R) -> Result<SweepReport, SweepError> {
        self.config.validate()?;

        let results = ResultsFile::new(&self.config.output);
        results.prepare()?;
        let (uplink, downlink) = self.prepare_traces()?;

        let trials = axis::trials(&self.config.axes);
        let total = trials.len();
        let started = Instant::now();
        tracing::info!(
            total,
            output = %results.path().display(),
            passthrough = ?self.passthrough,
            "starting sweep"
        );

        for trial in &trials {
            self.check_cancelled(trial.index, total)?;

            let invocation = self.invocation(trial, &uplink, &downlink);
            tracing::info!(trial = trial.index + 1, total, params = %trial, "running trial");
            tracing::info!(command = %invocation, "invoking runner");

            let trial_started = Instant::now();
            if let Err(source) = runner.run(&invocation) {
                self.check_cancelled(trial.index, total)?;
                tracing::error!(
                    trial = trial.index + 1,
                    total,
                    params = %trial,
                    error = %source,
                    "trial failed, aborting sweep"
                );
                return Err(SweepError::Trial {
                    index: trial.index + 1,
                    total,
                    trial: trial.to_string(),
                    source,
                });
            }
            tracing::debug!(
                trial = trial.index + 1,
                elapsed_ms = trial_started.elapsed().as_millis() as u64,
                "trial complete"
            );

            // A completed sweep is not an interrupted one.
            if trial.index + 1 < total {
                self.check_cancelled(trial.index + 1, total)?;
            }
        }

        let elapsed = started.elapsed();
        tracing::info!(trials = total, elapsed_s = elapsed.as_secs_f64(), "sweep complete");
        Ok(SweepReport {
            trials: total,
            elapsed,
        })
    }

    fn invocation(&self, trial: &Trial, uplink: &Path, downlink: &Path) -> Invocation {
        Invocation::for_trial(
            &self.config.runner,
            trial,
            uplink,
            downlink,
            &self.config.output,
            &self.passthrough,
        )
    }

    fn trace_paths(&self) -> (PathBuf, PathBuf) {
        match &self.config.traces {
            TraceSource::Files { uplink, downlink } => (uplink.clone(), downlink.clone()),
            TraceSource::Generated {
                bandwidth_mbps,
                dir,
                ..
            } => trace::trace_paths(dir, *bandwidth_mbps),
        }
    }

    fn prepare_traces(&self) -> Result<(PathBuf, PathBuf), SweepError> {
        match &self.config.traces {
            TraceSource::Files { uplink, downlink } => {
                for path in [uplink, downlink] {
                    if !path.exists() {
                        tracing::warn!(path = %path.display(), "trace file not found");
                    }
                }
                Ok((uplink.clone(), downlink.clone()))
            }
            TraceSource::Generated {
                bandwidth_mbps,
                seconds,
                dir,
            } => {
                tracing::info!(
                    bandwidth_mbps,
                    seconds,
                    dir = %dir.display(),
                    "generating constant-rate traces"
                );
                trace::write_trace_pair(dir, *bandwidth_mbps, *seconds).map_err(|source| {
                    SweepError::Setup {
                        path: dir.clone(),
                        source,
                    }
                })
            }
        }
    }

    fn check_cancelled(&self, completed: usize, total: usize) -> Result<(), SweepError> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => {
                tracing::warn!(completed, total, "sweep interrupted");
                Err(SweepError::Interrupted { completed, total })
            }
            _ => Ok(()),
        }
    }
}
