use std::fmt;

use itertools::Itertools;
use serde::Deserialize;

/// A single value on a sweep axis.
///
/// Deserializes from a bare TOML integer, float or string. Rendered on the
/// runner's command line through [`fmt::Display`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl AxisValue {
    /// Numeric view of the value, `None` for text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AxisValue::Int(v) => Some(*v as f64),
            AxisValue::Float(v) => Some(*v),
            AxisValue::Text(_) => None,
        }
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Int(v) => write!(f, "{v}"),
            AxisValue::Float(v) => write!(f, "{v}"),
            AxisValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for AxisValue {
    fn from(v: &str) -> Self {
        AxisValue::Text(v.to_string())
    }
}

impl From<f64> for AxisValue {
    fn from(v: f64) -> Self {
        AxisValue::Float(v)
    }
}

impl From<i64> for AxisValue {
    fn from(v: i64) -> Self {
        AxisValue::Int(v)
    }
}

/// A named, ordered set of values to sweep.
///
/// `flag` is the runner option each value is passed under, e.g. `--cc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    pub flag: String,
    pub values: Vec<AxisValue>,
}

impl Axis {
    pub fn new<V: Into<AxisValue>>(
        name: &str,
        flag: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            name: name.to_string(),
            flag: flag.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// One axis value bound inside a [`Trial`].
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub axis: String,
    pub flag: String,
    pub value: AxisValue,
}

/// One point of the sweep: a value from every axis, in axis order.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    /// Zero-based position in sweep order.
    pub index: usize,
    pub assignments: Vec<Assignment>,
}

impl Trial {
    /// Value bound for the named axis, if the trial has one.
    pub fn value(&self, axis: &str) -> Option<&AxisValue> {
        self.assignments
            .iter()
            .find(|a| a.axis == axis)
            .map(|a| &a.value)
    }
}

impl fmt::Display for Trial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for a in &self.assignments {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}={}", a.axis, a.value)?;
        }
        Ok(())
    }
}

/// Cartesian product of `axes`, first-declared axis outermost.
///
/// For `A = [a1, a2]`, `L = [l1, l2]` the order is
/// `(a1,l1) (a1,l2) (a2,l1) (a2,l2)`. Yields nothing when there are no axes
/// or any axis is empty.
pub fn trials(axes: &[Axis]) -> Vec<Trial> {
    if axes.is_empty() || axes.iter().any(|a| a.values.is_empty()) {
        return Vec::new();
    }

    axes.iter()
        .map(|axis| axis.values.iter())
        .multi_cartesian_product()
        .enumerate()
        .map(|(index, combo)| Trial {
            index,
            assignments: axes
                .iter()
                .zip(combo)
                .map(|(axis, value)| Assignment {
                    axis: axis.name.clone(),
                    flag: axis.flag.clone(),
                    value: value.clone(),
                })
                .collect(),
        })
        .collect()
}
