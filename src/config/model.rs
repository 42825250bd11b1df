// src/config/model.rs

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{DagworkError, Result};
use crate::types::PanicPolicy;

/// Flow file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// on_task_panic = "abort"
/// deadline = "30s"
///
/// [task.build]
/// cmd = "cargo build"
///
/// [task.test]
/// cmd = "cargo test"
/// after = ["build"]
/// ```
///
/// All sections are optional at this stage; validation rejects a file
/// without tasks.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFlowFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// A validated flow file: every `after` reference exists and the task graph
/// is acyclic. Obtain one with `FlowFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct FlowFile {
    pub config: ConfigSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl FlowFile {
    pub(crate) fn new_unchecked(config: ConfigSection, task: BTreeMap<String, TaskConfig>) -> Self {
        Self { config, task }
    }

    /// Tasks without `after` entries; these become start nodes.
    pub fn start_tasks(&self) -> Vec<&str> {
        self.task
            .iter()
            .filter(|(_, t)| t.after.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Tasks that no other task lists in `after`; these are wired to the end
    /// node.
    pub fn exit_tasks(&self) -> Vec<&str> {
        let depended_on: BTreeSet<&str> = self
            .task
            .values()
            .flat_map(|t| t.after.iter().map(String::as_str))
            .collect();

        self.task
            .keys()
            .map(String::as_str)
            .filter(|name| !depended_on.contains(name))
            .collect()
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSection {
    /// `"abort"` (default) or `"continue"`.
    #[serde(default)]
    pub on_task_panic: PanicPolicy,

    /// Optional wall-clock limit for the whole flow, e.g. `"30s"`.
    #[serde(default)]
    pub deadline: Option<String>,
}

impl ConfigSection {
    pub fn deadline(&self) -> Result<Option<Duration>> {
        self.deadline
            .as_deref()
            .map(|s| {
                parse_duration(s).map_err(|e| {
                    DagworkError::ConfigError(format!("[config].deadline: {e}"))
                })
            })
            .transpose()
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command to execute.
    pub cmd: String,

    /// This task runs only after every task listed here has run.
    #[serde(default)]
    pub after: Vec<String>,
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;

    match unit_part.trim().to_lowercase().as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| "duration too large".to_string()),
        "h" => value
            .checked_mul(60 * 60)
            .map(Duration::from_secs)
            .ok_or_else(|| "duration too large".to_string()),
        unit => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
