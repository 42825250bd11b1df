// src/errors.rs

//! Crate-wide error types.
//!
//! [`FlowError`] is what the engine reports to whoever waits on a flow;
//! [`DagworkError`] covers the config/CLI layer around it.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("no Tokio runtime available to run the flow")]
    NoRuntime,

    #[error("end node has no inbound edges; the flow could never finish")]
    EndUnreachable,

    #[error("flow failed: {0}")]
    Failed(String),

    #[error("task '{node}' panicked: {message}")]
    TaskPanicked { node: String, message: String },

    #[error("flow did not finish within {0:?}; interrupted")]
    DeadlineExceeded(Duration),
}

#[derive(Error, Debug)]
pub enum DagworkError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Flow(#[from] FlowError),
}

pub type Result<T> = std::result::Result<T, DagworkError>;
