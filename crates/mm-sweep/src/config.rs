//! Sweep configuration.
//!
//! Parsed from TOML into raw `*Input` structs, then resolved and validated
//! into a [`SweepConfig`] before the driver touches the filesystem.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::axis::{Axis, AxisValue};
use crate::trace;

/// Axis name whose values are checked against [`SUPPORTED_CC`].
pub const CC_AXIS: &str = "congestion_control";
/// Axis name whose values must be loss percentages.
pub const LOSS_AXIS: &str = "loss";

/// Congestion-control algorithms the benchmark runner accepts.
pub const SUPPORTED_CC: &[&str] = &[
    "bbr", "cubic", "bic", "vegas", "westwood", "reno", "bbr557",
];

pub const DEFAULT_OUTPUT: &str = "data/experiment4.csv";
pub const DEFAULT_TRACE: &str = "traces/12mbps.trace";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(String),
    #[error("no sweep axes configured")]
    NoAxes,
    #[error("axis `{0}` has no values")]
    EmptyAxis(String),
    #[error("axis #{0} needs a name and a runner flag")]
    UnnamedAxis(usize),
    #[error("duplicate axis name `{0}`")]
    DuplicateAxis(String),
    #[error("duplicate runner flag `{0}`")]
    DuplicateFlag(String),
    #[error("`{0}` is not a supported congestion control algorithm")]
    UnsupportedAlgorithm(String),
    #[error("loss rate `{0}` is not a percentage in 0..=100")]
    InvalidLoss(String),
    #[error("runner program is empty")]
    NoRunner,
    #[error("output path is empty")]
    NoOutput,
    #[error("trace paths need both uplink and downlink")]
    MissingTrace,
    #[error(
        "generated traces need 0 < bandwidth_mbps <= {} and 0 < seconds <= {}",
        trace::MAX_BANDWIDTH_MBPS,
        trace::MAX_SECONDS
    )]
    InvalidTraceGen,
    #[error("path {} is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),
}

// ── Raw input ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SweepConfigInput {
    pub output: Option<PathBuf>,
    pub runner: RunnerConfigInput,
    pub traces: TracesInput,
    #[serde(rename = "axis")]
    pub axes: Vec<AxisInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunnerConfigInput {
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub trace_uplink_flag: Option<String>,
    pub trace_downlink_flag: Option<String>,
    pub output_flag: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TracesInput {
    pub uplink: Option<PathBuf>,
    pub downlink: Option<PathBuf>,
    pub generate: Option<TraceGenInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TraceGenInput {
    pub bandwidth_mbps: f64,
    pub seconds: u32,
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AxisInput {
    pub name: String,
    pub flag: String,
    pub values: Vec<AxisValue>,
}

// ── Resolved config ─────────────────────────────────────────────────

/// External benchmark command and the option names it understands.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub trace_uplink_flag: String,
    pub trace_downlink_flag: String,
    pub output_flag: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: "python".into(),
            args: vec!["bbr_experiment.py".into()],
            trace_uplink_flag: "--traceup".into(),
            trace_downlink_flag: "--tracedown".into(),
            output_flag: "--output_file".into(),
        }
    }
}

/// Where the uplink/downlink traces come from.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceSource {
    Files { uplink: PathBuf, downlink: PathBuf },
    /// Constant-rate traces written into `dir` during setup.
    Generated {
        bandwidth_mbps: f64,
        seconds: u32,
        dir: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub output: PathBuf,
    pub runner: RunnerConfig,
    pub traces: TraceSource,
    pub axes: Vec<Axis>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            runner: RunnerConfig::default(),
            traces: TraceSource::Files {
                uplink: PathBuf::from(DEFAULT_TRACE),
                downlink: PathBuf::from(DEFAULT_TRACE),
            },
            axes: vec![
                Axis::new(CC_AXIS, "--cc", ["bbr", "cubic"]),
                Axis::new(LOSS_AXIS, "--loss", [0.1, 1.0, 10.0]),
            ],
        }
    }
}

impl SweepConfigInput {
    pub fn resolve(self) -> Result<SweepConfig, ConfigError> {
        let defaults = SweepConfig::default();

        let output = self.output.unwrap_or(defaults.output);
        if output.as_os_str().is_empty() {
            return Err(ConfigError::NoOutput);
        }

        let base = defaults.runner;
        let runner = RunnerConfig {
            program: self
                .runner
                .program
                .map(|p| p.trim().to_string())
                .unwrap_or(base.program),
            args: self.runner.args.unwrap_or(base.args),
            trace_uplink_flag: self
                .runner
                .trace_uplink_flag
                .unwrap_or(base.trace_uplink_flag),
            trace_downlink_flag: self
                .runner
                .trace_downlink_flag
                .unwrap_or(base.trace_downlink_flag),
            output_flag: self.runner.output_flag.unwrap_or(base.output_flag),
        };
        if runner.program.is_empty() {
            return Err(ConfigError::NoRunner);
        }

        let traces = match (self.traces.generate, self.traces.uplink, self.traces.downlink) {
            (Some(generate), _, _) => {
                if !trace::valid_params(generate.bandwidth_mbps, generate.seconds) {
                    return Err(ConfigError::InvalidTraceGen);
                }
                TraceSource::Generated {
                    bandwidth_mbps: generate.bandwidth_mbps,
                    seconds: generate.seconds,
                    dir: generate.dir.unwrap_or_else(|| PathBuf::from("traces")),
                }
            }
            (None, Some(uplink), Some(downlink)) => TraceSource::Files { uplink, downlink },
            (None, None, None) => defaults.traces,
            _ => return Err(ConfigError::MissingTrace),
        };

        let axes = if self.axes.is_empty() {
            defaults.axes
        } else {
            self.axes
                .into_iter()
                .map(|a| Axis {
                    name: a.name.trim().to_string(),
                    flag: a.flag.trim().to_string(),
                    values: a.values,
                })
                .collect()
        };

        let cfg = SweepConfig {
            output,
            runner,
            traces,
            axes,
        };
        cfg.validate()?;
        Ok(cfg.normalized())
    }
}

impl SweepConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(SweepConfig::default());
        }
        let parsed: SweepConfigInput =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        parsed.resolve()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks every invariant the driver relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::NoOutput);
        }
        if self.runner.program.trim().is_empty() {
            return Err(ConfigError::NoRunner);
        }
        match &self.traces {
            TraceSource::Files { uplink, downlink } => {
                check_utf8(uplink)?;
                check_utf8(downlink)?;
            }
            TraceSource::Generated {
                bandwidth_mbps,
                seconds,
                dir,
            } => {
                if !trace::valid_params(*bandwidth_mbps, *seconds) {
                    return Err(ConfigError::InvalidTraceGen);
                }
                check_utf8(dir)?;
            }
        }
        check_utf8(&self.output)?;

        if self.axes.is_empty() {
            return Err(ConfigError::NoAxes);
        }
        let mut names = HashSet::new();
        let mut flags = HashSet::new();
        for (idx, axis) in self.axes.iter().enumerate() {
            if axis.name.is_empty() || axis.flag.is_empty() {
                return Err(ConfigError::UnnamedAxis(idx));
            }
            if !names.insert(axis.name.as_str()) {
                return Err(ConfigError::DuplicateAxis(axis.name.clone()));
            }
            if !flags.insert(axis.flag.as_str()) {
                return Err(ConfigError::DuplicateFlag(axis.flag.clone()));
            }
            if axis.values.is_empty() {
                return Err(ConfigError::EmptyAxis(axis.name.clone()));
            }
            match axis.name.as_str() {
                CC_AXIS => {
                    for value in &axis.values {
                        check_algorithm(value)?;
                    }
                }
                LOSS_AXIS => {
                    for value in &axis.values {
                        match value.as_f64() {
                            Some(pct) if (0.0..=100.0).contains(&pct) => {}
                            _ => return Err(ConfigError::InvalidLoss(value.to_string())),
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Lower-cases congestion-control identifiers.
    fn normalized(mut self) -> Self {
        for axis in self.axes.iter_mut().filter(|a| a.name == CC_AXIS) {
            for value in axis.values.iter_mut() {
                if let AxisValue::Text(s) = value {
                    *s = s.to_lowercase();
                }
            }
        }
        self
    }

    /// Number of trials the sweep will run. Zero when there are no axes.
    pub fn trial_count(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes.iter().map(|a| a.values.len()).product()
    }
}

/// Paths end up as runner arguments, which are plain strings.
fn check_utf8(path: &Path) -> Result<(), ConfigError> {
    match path.to_str() {
        Some(_) => Ok(()),
        None => Err(ConfigError::NonUtf8Path(path.to_path_buf())),
    }
}

fn check_algorithm(value: &AxisValue) -> Result<(), ConfigError> {
    match value {
        AxisValue::Text(s) if SUPPORTED_CC.contains(&s.to_lowercase().as_str()) => Ok(()),
        other => Err(ConfigError::UnsupportedAlgorithm(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_uses_defaults() {
        let cfg = SweepConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, SweepConfig::default());
        assert_eq!(cfg.trial_count(), 6);
        assert_eq!(cfg.output, PathBuf::from("data/experiment4.csv"));
    }

    #[test]
    fn parse_toml_config_basic() {
        let toml = r#"
            output = "data/experiment4.csv"

            [runner]
            program = "python"
            args = ["bbr_experiment.py", "--headless"]

            [traces]
            uplink = "traces/up.trace"
            downlink = "traces/down.trace"

            [[axis]]
            name = "congestion_control"
            flag = "--cc"
            values = ["BBR557", "bbr"]

            [[axis]]
            name = "loss"
            flag = "--loss"
            values = [0.1, 1, 10]
        "#;

        let cfg = SweepConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.runner.args, vec!["bbr_experiment.py", "--headless"]);
        assert_eq!(cfg.runner.output_flag, "--output_file");
        assert_eq!(
            cfg.traces,
            TraceSource::Files {
                uplink: "traces/up.trace".into(),
                downlink: "traces/down.trace".into(),
            }
        );
        assert_eq!(cfg.axes.len(), 2);
        assert_eq!(cfg.axes[0].values[0], AxisValue::from("bbr557"));
        assert_eq!(
            cfg.axes[1].values,
            vec![AxisValue::Float(0.1), AxisValue::Int(1), AxisValue::Int(10)]
        );
        assert_eq!(cfg.trial_count(), 6);
    }

    #[test]
    fn generated_traces() {
        let toml = r#"
            [traces.generate]
            bandwidth_mbps = 100
            seconds = 60
        "#;
        let cfg = SweepConfig::from_toml_str(toml).unwrap();
        assert_eq!(
            cfg.traces,
            TraceSource::Generated {
                bandwidth_mbps: 100.0,
                seconds: 60,
                dir: "traces".into(),
            }
        );

        let bad = "[traces.generate]\nbandwidth_mbps = 0\nseconds = 60\n";
        assert!(matches!(
            SweepConfig::from_toml_str(bad),
            Err(ConfigError::InvalidTraceGen)
        ));
    }

    #[test]
    fn oversized_trace_generation_rejected() {
        for toml in [
            "[traces.generate]\nbandwidth_mbps = 1e20\nseconds = 1\n",
            "[traces.generate]\nbandwidth_mbps = 100\nseconds = 86400\n",
        ] {
            assert!(matches!(
                SweepConfig::from_toml_str(toml),
                Err(ConfigError::InvalidTraceGen)
            ));
        }
    }

    #[test]
    fn missing_config_file_keeps_io_source() {
        use std::error::Error as _;

        let err = SweepConfig::load(Path::new("/nonexistent/mm-sweep.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        let source = err.source().and_then(|e| e.downcast_ref::<std::io::Error>());
        assert_eq!(source.map(|e| e.kind()), Some(std::io::ErrorKind::NotFound));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut cfg = SweepConfig::default();
        cfg.output = PathBuf::from(OsStr::from_bytes(b"data/exp\xff.csv"));
        assert!(matches!(cfg.validate(), Err(ConfigError::NonUtf8Path(_))));
    }

    #[test]
    fn trial_count_is_zero_without_axes() {
        let mut cfg = SweepConfig::default();
        cfg.axes.clear();
        assert_eq!(cfg.trial_count(), 0);
        assert_eq!(cfg.trial_count(), crate::axis::trials(&cfg.axes).len());
    }

    #[test]
    fn half_trace_pair_rejected() {
        let toml = "[traces]\nuplink = \"up\"\n";
        assert!(matches!(
            SweepConfig::from_toml_str(toml),
            Err(ConfigError::MissingTrace)
        ));
    }

    #[test]
    fn unknown_algorithm_rejected() {
        let toml = r#"
            [[axis]]
            name = "congestion_control"
            flag = "--cc"
            values = ["bbr", "quic"]
        "#;
        assert!(matches!(
            SweepConfig::from_toml_str(toml),
            Err(ConfigError::UnsupportedAlgorithm(s)) if s == "quic"
        ));
    }

    #[test]
    fn loss_must_be_percentage() {
        let toml = r#"
            [[axis]]
            name = "loss"
            flag = "--loss"
            values = [0.1, 120]
        "#;
        assert!(matches!(
            SweepConfig::from_toml_str(toml),
            Err(ConfigError::InvalidLoss(s)) if s == "120"
        ));

        let toml = r#"
            [[axis]]
            name = "loss"
            flag = "--loss"
            values = ["high"]
        "#;
        assert!(matches!(
            SweepConfig::from_toml_str(toml),
            Err(ConfigError::InvalidLoss(s)) if s == "high"
        ));
    }

    #[test]
    fn axis_shape_errors() {
        let empty = r#"
            [[axis]]
            name = "rtt"
            flag = "--rtt"
            values = []
        "#;
        assert!(matches!(
            SweepConfig::from_toml_str(empty),
            Err(ConfigError::EmptyAxis(s)) if s == "rtt"
        ));

        let dup_flag = r#"
            [[axis]]
            name = "rtt"
            flag = "--rtt"
            values = [50]
            [[axis]]
            name = "delay"
            flag = "--rtt"
            values = [100]
        "#;
        assert!(matches!(
            SweepConfig::from_toml_str(dup_flag),
            Err(ConfigError::DuplicateFlag(s)) if s == "--rtt"
        ));

        let dup_name = r#"
            [[axis]]
            name = "rtt"
            flag = "--rtt"
            values = [50]
            [[axis]]
            name = "rtt"
            flag = "--delay"
            values = [100]
        "#;
        assert!(matches!(
            SweepConfig::from_toml_str(dup_name),
            Err(ConfigError::DuplicateAxis(s)) if s == "rtt"
        ));
    }

    #[test]
    fn empty_program_rejected() {
        let toml = "[runner]\nprogram = \"  \"\n";
        assert!(matches!(
            SweepConfig::from_toml_str(toml),
            Err(ConfigError::NoRunner)
        ));
    }

    #[test]
    fn bad_toml_is_parse_error() {
        assert!(matches!(
            SweepConfig::from_toml_str("output = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn validate_catches_hand_built_config() {
        let mut cfg = SweepConfig::default();
        cfg.axes.clear();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NoAxes)
        ));
    }
}
