//! Constant-rate Mahimahi link traces.
//!
//! A trace is a text file with one millisecond timestamp per line; each line
//! is one delivery opportunity for a 1500-byte packet. `mm-link` loops the
//! file, so a trace only needs to cover one period.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Bits delivered per trace line (one MTU-sized packet).
pub const BITS_PER_OPPORTUNITY: f64 = 12_000.0;

/// Upper bound on generated link bandwidth (100 Gbps).
pub const MAX_BANDWIDTH_MBPS: f64 = 100_000.0;
/// Upper bound on generated trace length.
pub const MAX_SECONDS: u32 = 3600;

/// Whether `bandwidth_mbps` and `seconds` describe a trace we will write.
pub fn valid_params(bandwidth_mbps: f64, seconds: u32) -> bool {
    bandwidth_mbps.is_finite()
        && bandwidth_mbps > 0.0
        && bandwidth_mbps <= MAX_BANDWIDTH_MBPS
        && seconds > 0
        && seconds <= MAX_SECONDS
}

/// Delivery-opportunity timestamps (ms, 1-based) for a link of
/// `bandwidth_mbps` lasting `seconds`, produced lazily.
///
/// Each millisecond gets either `floor(bw / 12)` or one more opportunity;
/// the rounding error is carried forward so the long-run rate matches the
/// requested bandwidth.
pub fn constant_rate(bandwidth_mbps: f64, seconds: u32) -> impl Iterator<Item = u64> {
    // 1 Mbps is 1000 bits per millisecond.
    let per_ms = BITS_PER_OPPORTUNITY / 1000.0;
    let low = (bandwidth_mbps / per_ms).floor().max(0.0) as u64;
    let high = low.saturating_add(1);
    let low_err = bandwidth_mbps - low as f64 * per_ms;
    let high_err = bandwidth_mbps - high as f64 * per_ms;

    let total_ms = u64::from(seconds) * 1000;
    (1..=total_ms)
        .scan(0.0f64, move |accumulated, ms| {
            let n = if *accumulated >= high_err.abs() {
                *accumulated += high_err;
                high
            } else {
                *accumulated += low_err;
                low
            };
            Some(std::iter::repeat(ms).take(usize::try_from(n).unwrap_or(usize::MAX)))
        })
        .flatten()
}

/// File names `mm-link` is pointed at for a generated bandwidth.
pub fn trace_paths(dir: &Path, bandwidth_mbps: f64) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{bandwidth_mbps}Mbps.up")),
        dir.join(format!("{bandwidth_mbps}Mbps.down")),
    )
}

/// Writes identical uplink and downlink traces into `dir`, creating it.
///
/// Returns `(uplink, downlink)` paths.
pub fn write_trace_pair(
    dir: &Path,
    bandwidth_mbps: f64,
    seconds: u32,
) -> io::Result<(PathBuf, PathBuf)> {
    if !valid_params(bandwidth_mbps, seconds) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "trace needs 0 < bandwidth <= {MAX_BANDWIDTH_MBPS} Mbps and 0 < seconds <= {MAX_SECONDS}"
            ),
        ));
    }

    fs::create_dir_all(dir)?;
    let (up, down) = trace_paths(dir, bandwidth_mbps);
    let mut lines = 0;
    for path in [&up, &down] {
        lines = write_trace(path, constant_rate(bandwidth_mbps, seconds))?;
    }
    tracing::debug!(
        uplink = %up.display(),
        downlink = %down.display(),
        lines,
        "wrote constant-rate traces"
    );
    Ok((up, down))
}

fn write_trace(path: &Path, stamps: impl Iterator<Item = u64>) -> io::Result<u64> {
    let mut out = BufWriter::new(File::create(path)?);
    let mut lines = 0u64;
    for ms in stamps {
        writeln!(out, "{ms}")?;
        lines += 1;
    }
    out.flush()?;
    Ok(lines)
}
