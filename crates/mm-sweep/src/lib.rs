//! Experiment driver for Mahimahi trace-replay congestion-control sweeps.
//!
//! Enumerates the Cartesian product of configured axes (congestion-control
//! algorithm, loss rate, ...) and invokes an external benchmark runner once
//! per combination, all runs appending to one shared CSV results file.

pub mod axis;
pub mod config;
pub mod driver;
pub mod error;
pub mod results;
pub mod runner;
pub mod trace;

pub mod test_util;

pub use config::SweepConfig;
pub use driver::{SweepDriver, SweepReport};
pub use error::SweepError;
pub use runner::{Invocation, ProcessRunner, RunnerError, TrialRunner};
