// src/engine/mod.rs

//! Execution engine for dagwork.
//!
//! This module ties together:
//! - the [`Runnable`] capability every node task implements
//! - the termination gate that signals "this flow is over" exactly once
//!   ([`gate`])
//! - the flow construction and control API ([`workflow`])
//! - the concurrent traversal that dispatches ready nodes ([`traverse`])

/// Task executed by a node.
///
/// `run` is called synchronously on a traversal branch with the payload given
/// to [`WorkFlow::start`]. The payload is shared by every task of the flow;
/// any interior mutability inside it is the task's business.
pub trait Runnable<P>: Send + Sync {
    fn run(&self, payload: &P);
}

impl<P, F> Runnable<P> for F
where
    F: Fn(&P) + Send + Sync,
{
    fn run(&self, payload: &P) {
        self(payload)
    }
}

/// How a flow ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every exit path reached the end node.
    Finished,
    /// The flow was interrupted before it reached its end node.
    Interrupted,
}

pub mod gate;
pub mod traverse;
pub mod workflow;

pub use gate::{DoneGate, InterruptHandle, Termination};
pub use workflow::{RunningFlow, WorkFlow};
pub use crate::types::PanicPolicy;
