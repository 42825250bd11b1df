// src/types.rs

use std::str::FromStr;
use serde::Deserialize;

/// What the engine does when a node task panics.
///
/// - `Abort`: fail the whole flow, stop the branch and wake the waiter with
///   the panic message (default behaviour).
/// - `Continue`: log the panic and keep traversing as if the task had
///   returned normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PanicPolicy {
    #[default]
    Abort,
    Continue,
}

impl FromStr for PanicPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(PanicPolicy::Abort),
            "continue" => Ok(PanicPolicy::Continue),
            other => Err(format!(
                "invalid on_task_panic: {other} (expected \"abort\" or \"continue\")"
            )),
        }
    }
}
