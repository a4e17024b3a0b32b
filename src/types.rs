// src/types.rs

//! Small value types shared between the config layer and the scheduler.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Effect a finished task's exit status has on the tasks that depend on it.
///
/// - `Satisfy`: the dependency counts as met.
/// - `Block`: dependents can never run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitAction {
    Satisfy,
    Block,
}

impl FromStr for ExitAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "satisfy" => Ok(ExitAction::Satisfy),
            "block" => Ok(ExitAction::Block),
            other => Err(format!(
                "invalid dependency action: {other} (expected \"satisfy\" or \"block\")"
            )),
        }
    }
}

impl fmt::Display for ExitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitAction::Satisfy => f.write_str("satisfy"),
            ExitAction::Block => f.write_str("block"),
        }
    }
}

/// Terminal status reported by an executor for a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    Success,
    Failure(i32),
    /// The task never got to run its command (e.g. the process could not
    /// be started, or its inputs could not be staged).
    PreProcessingError,
}

impl ExitStatus {
    /// Exit code used for exact-code policy lookups, if the status has one.
    ///
    /// `Success` is treated as exit code `0`.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Failure(code) => Some(*code),
            ExitStatus::PreProcessingError => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Success => f.write_str("success"),
            ExitStatus::Failure(code) => write!(f, "failure({code})"),
            ExitStatus::PreProcessingError => f.write_str("pre-processing error"),
        }
    }
}

/// Parse a simple duration string like `"5s"`, `"250ms"`, `"10m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => scaled_secs(value, 60),
        "h" => scaled_secs(value, 60 * 60),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

fn scaled_secs(value: u64, secs_per_unit: u64) -> Result<Duration, String> {
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: {value} x {secs_per_unit}s"))
}
