// src/engine/gate.rs

//! Termination gate shared by the end node, interrupters and the waiter.
//!
//! The gate is a single-assignment cell: whichever of "end node reached",
//! "interrupted" or "failed" happens first is recorded, the waiter is woken,
//! and every later attempt is ignored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::Notify;
use tracing::{debug, warn};

use super::Runnable;

/// Why a flow stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The end node ran.
    Completed,
    /// `interrupt` was called.
    Interrupted,
    /// A task or an outside observer reported failure.
    Failed(String),
    /// A task panicked while the flow ran with `PanicPolicy::Abort`.
    Panicked { node: String, message: String },
}

/// One-shot notification with a single waiter.
#[derive(Debug, Default)]
pub struct DoneGate {
    outcome: OnceLock<Termination>,
    notify: Notify,
}

impl DoneGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `termination` and wake the waiter.
    ///
    /// Returns `true` only for the call that actually fired the gate; any
    /// number of concurrent or later calls are no-ops returning `false`.
    pub fn fire(&self, termination: Termination) -> bool {
        if self.outcome.set(termination).is_ok() {
            // notify_one keeps a permit when nobody is waiting yet.
            self.notify.notify_one();
            true
        } else {
            false
        }
    }

    pub fn is_fired(&self) -> bool {
        self.outcome.get().is_some()
    }

    pub fn outcome(&self) -> Option<&Termination> {
        self.outcome.get()
    }

    /// Wait until the gate fires and return the recorded termination.
    pub async fn wait(&self) -> &Termination {
        loop {
            if let Some(termination) = self.outcome.get() {
                return termination;
            }
            self.notify.notified().await;
        }
    }
}

/// State shared by every participant of one flow execution.
#[derive(Debug, Default)]
pub(crate) struct FlowState {
    pub(crate) gate: DoneGate,
    terminated: AtomicBool,
}

impl FlowState {
    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Mark the flow terminated and force the gate with `termination`.
    pub(crate) fn terminate(&self, termination: Termination) -> bool {
        self.terminated.store(true, Ordering::Release);
        self.gate.fire(termination)
    }
}

/// Cloneable handle used to stop a flow from outside the engine or from
/// inside one of its tasks.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    state: Arc<FlowState>,
}

impl InterruptHandle {
    pub(crate) fn new(state: Arc<FlowState>) -> Self {
        Self { state }
    }

    /// Stop the flow. Branches in flight stop at their next node boundary;
    /// the waiter is released right away. Calling this again is a no-op.
    pub fn interrupt(&self) {
        if self.state.terminate(Termination::Interrupted) {
            warn!("flow interrupted");
        } else {
            debug!("interrupt ignored; flow already terminated");
        }
    }

    /// Stop the flow and report it as failed with `reason`.
    pub fn fail(&self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.state.terminate(Termination::Failed(reason.clone())) {
            warn!(%reason, "flow failed");
        } else {
            debug!(%reason, "failure ignored; flow already terminated");
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.state.is_terminated()
    }
}

/// Task bound to the end node of every flow.
pub(crate) struct EndAction {
    state: Arc<FlowState>,
}

impl EndAction {
    pub(crate) fn new(state: Arc<FlowState>) -> Self {
        Self { state }
    }
}

impl<P> Runnable<P> for EndAction {
    fn run(&self, _payload: &P) {
        if self.state.gate.fire(Termination::Completed) {
            debug!("end node reached; flow completed");
        } else {
            debug!("end node reached after the flow already terminated");
        }
    }
}
