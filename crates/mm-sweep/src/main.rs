//! mm-sweep
//!
//! Sweeps congestion-control algorithms against emulated loss rates by
//! invoking the trace-replay benchmark once per combination. Every run
//! appends to one results CSV, which is cleared when the sweep starts.
//!
//! Arguments after `--` are forwarded verbatim to every benchmark run.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mm_sweep::{ProcessRunner, SweepConfig, SweepDriver};
use tracing_subscriber::EnvFilter;

/// Congestion-control x loss-rate sweep driver.
#[derive(Parser, Debug)]
#[command(name = "mm-sweep", about = "Run a Mahimahi congestion-control sweep")]
struct Cli {
    /// Sweep config (TOML). Built-in bbr/cubic x 0.1/1/10 sweep when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Results CSV path, overrides the config.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the planned runner commands and exit.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Extra arguments forwarded to every benchmark run.
    #[arg(last = true, value_name = "RUNNER_ARGS")]
    passthrough: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SweepConfig::load(path)
            .with_context(|| format!("loading sweep config {}", path.display()))?,
        None => SweepConfig::default(),
    };
    if let Some(output) = cli.output {
        config.output = output;
    }
    config.validate().context("invalid sweep config")?;

    let driver = SweepDriver::new(&config).passthrough(cli.passthrough);

    if cli.dry_run {
        for invocation in driver.plan() {
            println!("{invocation}");
        }
        return Ok(());
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("interrupt received, stopping after current trial");
            cancel.store(true, Ordering::Relaxed);
        })
        .context("installing Ctrl-C handler")?;
    }

    tracing::info!(
        runner = %config.runner.program,
        trials = config.trial_count(),
        output = %config.output.display(),
        "mm-sweep starting"
    );

    let report = driver
        .cancel_flag(cancel)
        .run(&mut ProcessRunner::new())
        .context("sweep aborted")?;

    tracing::info!(
        trials = report.trials,
        elapsed_s = report.elapsed.as_secs_f64(),
        output = %config.output.display(),
        "all trials complete"
    );
    Ok(())
}
