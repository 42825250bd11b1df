// src/engine/workflow.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dag::{EdgeId, Graph, NodeId};
use crate::errors::FlowError;
use crate::types::PanicPolicy;

use super::gate::{EndAction, FlowState, InterruptHandle, Termination};
use super::traverse::Traversal;
use super::{Completion, Runnable};

/// A flow under construction.
///
/// Every flow owns a synthetic root (no task) that fans out to the nodes
/// registered with [`add_start_node`](Self::add_start_node), and an end node
/// whose task fires the flow's termination gate. Exit nodes are wired to it
/// with [`connect_to_end`](Self::connect_to_end).
///
/// Construction takes `&mut self`; [`start`](Self::start) consumes the flow,
/// so a graph can neither change while it runs nor be started twice.
#[derive(Debug)]
pub struct WorkFlow<P> {
    graph: Graph<P>,
    root: NodeId,
    end: NodeId,
    state: Arc<FlowState>,
    panic_policy: PanicPolicy,
}

impl<P> Default for WorkFlow<P>
where
    P: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> WorkFlow<P>
where
    P: Send + Sync + 'static,
{
    pub fn new() -> Self {
        let state = Arc::new(FlowState::default());
        let mut graph = Graph::new();

        let root = graph.new_empty_node();
        graph.set_label(root, "root");

        let end = graph.push_node(Some(Box::new(EndAction::new(Arc::clone(&state)))));
        graph.set_label(end, "end");

        Self {
            graph,
            root,
            end,
            state,
            panic_policy: PanicPolicy::default(),
        }
    }

    pub fn with_panic_policy(mut self, policy: PanicPolicy) -> Self {
        self.panic_policy = policy;
        self
    }

    pub fn panic_policy(&self) -> PanicPolicy {
        self.panic_policy
    }

    pub fn new_node(&mut self, task: impl Runnable<P> + 'static) -> NodeId {
        self.graph.new_node(task)
    }

    /// Like [`new_node`](Self::new_node), with a label used in logs and
    /// failure messages.
    pub fn new_named_node(
        &mut self,
        label: impl Into<String>,
        task: impl Runnable<P> + 'static,
    ) -> NodeId {
        let id = self.graph.new_node(task);
        self.graph.set_label(id, label);
        id
    }

    pub fn new_empty_node(&mut self) -> NodeId {
        self.graph.new_empty_node()
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> EdgeId {
        self.graph.add_edge(from, to)
    }

    /// Make `node` an entry point of the flow.
    pub fn add_start_node(&mut self, node: NodeId) -> EdgeId {
        self.graph.add_edge(self.root, node)
    }

    /// Make `node` an exit point of the flow.
    pub fn connect_to_end(&mut self, node: NodeId) -> EdgeId {
        self.graph.add_edge(node, self.end)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    pub fn graph(&self) -> &Graph<P> {
        &self.graph
    }

    /// Handle that can interrupt or fail the flow once it runs. Tasks may
    /// capture one to report their own failures.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle::new(Arc::clone(&self.state))
    }

    /// Begin executing the flow in the background and return immediately.
    ///
    /// Must be called from within a Tokio runtime; branches run on its
    /// blocking pool. `cancel` is checked at every node entry and `payload`
    /// is handed by reference to every task.
    pub fn start(
        self,
        cancel: CancellationToken,
        payload: impl Into<Arc<P>>,
    ) -> Result<RunningFlow, FlowError> {
        let runtime = Handle::try_current().map_err(|_| FlowError::NoRuntime)?;

        if self.graph.node(self.end).dependency().is_empty() {
            return Err(FlowError::EndUnreachable);
        }

        info!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            start_nodes = self.graph.node(self.root).children().len(),
            exit_nodes = self.graph.node(self.end).dependency().len(),
            "starting flow"
        );

        let state = self.state;
        let root = self.root;
        let traversal = Arc::new(Traversal::new(
            self.graph,
            Arc::clone(&state),
            cancel.clone(),
            payload.into(),
            runtime,
            self.panic_policy,
        ));
        traversal.spawn_branch(root);

        Ok(RunningFlow { state, cancel })
    }
}

/// A started flow.
///
/// [`wait_done`](Self::wait_done) consumes it, so the termination signal is
/// consumed at most once.
#[derive(Debug)]
pub struct RunningFlow {
    state: Arc<FlowState>,
    cancel: CancellationToken,
}

impl RunningFlow {
    /// Wait until the end node runs, the flow is interrupted or fails.
    ///
    /// Cancelling the token given to `start` interrupts the flow, so the
    /// wait is released even if no branch reaches the end node.
    pub async fn wait_done(self) -> Result<Completion, FlowError> {
        let termination = self.wait_termination().await;
        info!(?termination, "flow done");
        into_result(termination)
    }

    /// Like [`wait_done`](Self::wait_done), but interrupts the flow if it is
    /// not done within `deadline`.
    pub async fn wait_done_timeout(self, deadline: Duration) -> Result<Completion, FlowError> {
        match tokio::time::timeout(deadline, self.wait_termination()).await {
            Ok(termination) => {
                info!(?termination, "flow done");
                into_result(termination)
            }
            Err(_elapsed) => {
                if self.state.terminate(Termination::Interrupted) {
                    warn!(?deadline, "flow deadline exceeded; interrupted");
                    Err(FlowError::DeadlineExceeded(deadline))
                } else {
                    // The gate fired between the timeout and the interrupt.
                    let termination = self.wait_termination().await;
                    into_result(termination)
                }
            }
        }
    }

    pub fn interrupt(&self) {
        self.interrupt_handle().interrupt();
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle::new(Arc::clone(&self.state))
    }

    pub fn is_terminated(&self) -> bool {
        self.state.is_terminated()
    }

    async fn wait_termination(&self) -> Termination {
        tokio::select! {
            termination = self.state.gate.wait() => termination.clone(),
            _ = self.cancel.cancelled() => {
                if self.state.terminate(Termination::Interrupted) {
                    debug!("cancellation requested; flow interrupted");
                }
                self.state.gate.wait().await.clone()
            }
        }
    }
}

fn into_result(termination: Termination) -> Result<Completion, FlowError> {
    match termination {
        Termination::Completed => Ok(Completion::Finished),
        Termination::Interrupted => Ok(Completion::Interrupted),
        Termination::Failed(reason) => Err(FlowError::Failed(reason)),
        Termination::Panicked { node, message } => {
            Err(FlowError::TaskPanicked { node, message })
        }
    }
}
