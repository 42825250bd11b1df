// src/exec/mod.rs

//! Process execution layer for the `dagwork` binary.
//!
//! - [`command`] provides `CommandTask`, a [`Runnable`](crate::engine::Runnable)
//!   that runs a shell command and fails the flow on a non-zero exit.
//! - [`builder`] turns a validated flow file into a `WorkFlow` of command
//!   tasks.

pub mod builder;
pub mod command;

pub use builder::build_workflow;
pub use command::{CommandEnv, CommandTask};
