// src/engine/traverse.rs

//! Concurrent traversal of a started flow.
//!
//! Every branch walks the graph on a blocking thread. At a node it:
//! 1. records its arrival and stops unless it completed the dependency count,
//! 2. stops if the flow was cancelled or terminated,
//! 3. runs the node's task,
//! 4. spawns a new branch for every child but the first, and continues with
//!    the first child itself.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::dag::{Graph, NodeId};
use crate::types::PanicPolicy;

use super::Runnable;
use super::gate::{FlowState, Termination};

/// Everything a traversal branch needs, shared by all branches of one run.
pub(crate) struct Traversal<P> {
    graph: Graph<P>,
    state: Arc<FlowState>,
    cancel: CancellationToken,
    payload: Arc<P>,
    runtime: Handle,
    panic_policy: PanicPolicy,
}

impl<P> Traversal<P>
where
    P: Send + Sync + 'static,
{
    pub(crate) fn new(
        graph: Graph<P>,
        state: Arc<FlowState>,
        cancel: CancellationToken,
        payload: Arc<P>,
        runtime: Handle,
        panic_policy: PanicPolicy,
    ) -> Self {
        Self {
            graph,
            state,
            cancel,
            payload,
            runtime,
            panic_policy,
        }
    }

    /// Start a new branch at `node` on the blocking pool.
    pub(crate) fn spawn_branch(self: &Arc<Self>, node: NodeId) {
        let this = Arc::clone(self);
        // Branches are never joined; the gate is how completion is observed.
        let _ = self.runtime.spawn_blocking(move || this.execute(node));
    }

    /// Walk the graph from `start` on the current thread.
    pub(crate) fn execute(self: &Arc<Self>, start: NodeId) {
        let mut current = start;

        loop {
            let node = self.graph.node(current);

            if !node.dependency_has_completed() {
                trace!(
                    node = %self.graph.display_name(current),
                    arrived = node.dep_completed(),
                    total = node.dependency().len(),
                    "dependencies pending; branch stops here"
                );
                return;
            }

            if self.is_cancelled() {
                debug!(
                    node = %self.graph.display_name(current),
                    "flow cancelled; skipping node"
                );
                return;
            }

            if let Some(task) = node.task.as_deref() {
                if !self.run_task(current, task) {
                    return;
                }
            }

            let mut children = node.children().iter();
            let Some(first) = children.next() else {
                return;
            };

            for edge in children {
                self.spawn_branch(self.graph.edge(*edge).to);
            }

            current = self.graph.edge(*first).to;
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.state.is_terminated()
    }

    /// Run one task, catching panics. Returns whether the branch continues.
    fn run_task(&self, id: NodeId, task: &dyn Runnable<P>) -> bool {
        debug!(node = %self.graph.display_name(id), "running task");

        let result = panic::catch_unwind(AssertUnwindSafe(|| task.run(&self.payload)));
        let Err(payload) = result else {
            return true;
        };

        let node = self.graph.display_name(id);
        let message = panic_message(payload.as_ref());

        match self.panic_policy {
            PanicPolicy::Abort => {
                error!(%node, %message, "task panicked; aborting flow");
                self.state
                    .terminate(Termination::Panicked { node, message });
                false
            }
            PanicPolicy::Continue => {
                warn!(%node, %message, "task panicked; continuing");
                true
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
