//! Writes a constant-rate Mahimahi uplink/downlink trace pair.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mm_sweep::trace;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mm-trace-gen", about = "Generate constant-rate Mahimahi traces")]
struct Cli {
    /// Link bandwidth in Mbps.
    #[arg(long, default_value_t = 100.0)]
    bandwidth: f64,

    /// Trace length in seconds.
    #[arg(long, default_value_t = 60)]
    seconds: u32,

    /// Output directory; files are named `<bw>Mbps.up` / `<bw>Mbps.down`.
    #[arg(long, default_value = ".")]
    dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if !trace::valid_params(cli.bandwidth, cli.seconds) {
        anyhow::bail!(
            "--bandwidth must be in (0, {}] Mbps and --seconds in 1..={}",
            trace::MAX_BANDWIDTH_MBPS,
            trace::MAX_SECONDS
        );
    }

    let (up, down) = trace::write_trace_pair(&cli.dir, cli.bandwidth, cli.seconds)
        .with_context(|| format!("writing traces into {}", cli.dir.display()))?;

    tracing::info!(
        bandwidth_mbps = cli.bandwidth,
        seconds = cli.seconds,
        uplink = %up.display(),
        downlink = %down.display(),
        "traces written"
    );
    Ok(())
}
