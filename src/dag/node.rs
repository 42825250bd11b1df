// src/dag/node.rs

//! Units of work and their dependency bookkeeping.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::dag::edge::EdgeId;
use crate::engine::Runnable;

/// Index of a [`Node`] inside its owning [`Graph`](crate::dag::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A unit of work with its inbound and outbound edges.
///
/// `dep_completed` counts how many inbound edges have been traversed in the
/// current execution. It is only ever touched through an atomic increment.
pub struct Node<P> {
    pub(crate) label: Option<String>,
    pub(crate) dependency: Vec<EdgeId>,
    dep_completed: AtomicUsize,
    pub(crate) task: Option<Box<dyn Runnable<P>>>,
    pub(crate) children: Vec<EdgeId>,
}

impl<P> fmt::Debug for Node<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("label", &self.label)
            .field("dependency", &self.dependency)
            .field("dep_completed", &self.dep_completed())
            .field("has_task", &self.task.is_some())
            .field("children", &self.children)
            .finish()
    }
}

impl<P> Node<P> {
    pub(crate) fn new(task: Option<Box<dyn Runnable<P>>>) -> Self {
        Self {
            label: None,
            dependency: Vec::new(),
            dep_completed: AtomicUsize::new(0),
            task,
            children: Vec::new(),
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Inbound edges, in insertion order.
    pub fn dependency(&self) -> &[EdgeId] {
        &self.dependency
    }

    /// Outbound edges, in insertion order. The first one is traversed inline.
    pub fn children(&self) -> &[EdgeId] {
        &self.children
    }

    pub fn has_task(&self) -> bool {
        self.task.is_some()
    }

    /// Number of inbound edges traversed so far.
    pub fn dep_completed(&self) -> usize {
        self.dep_completed.load(Ordering::Acquire)
    }

    /// Record the arrival of one inbound traversal and report readiness.
    ///
    /// A node without inbound edges is always ready and its counter is left
    /// untouched. Otherwise exactly one caller, the one that brings the
    /// counter up to the number of inbound edges, observes `true`.
    ///
    /// `AcqRel` makes the effects of every earlier arrival visible to the
    /// caller that wins readiness.
    pub fn dependency_has_completed(&self) -> bool {
        let total = self.dependency.len();
        if total == 0 {
            return true;
        }

        let arrived = self.dep_completed.fetch_add(1, Ordering::AcqRel) + 1;
        arrived == total
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::*;

    fn node_with_deps(n: usize) -> Node<()> {
        let mut node = Node::new(None);
        node.dependency = (0..n).map(EdgeId).collect();
        node
    }

    #[test]
    fn no_inbound_edges_is_ready_without_counting() {
        let node = node_with_deps(0);
        assert!(node.dependency_has_completed());
        assert!(node.dependency_has_completed());
        assert_eq!(node.dep_completed(), 0);
    }

    #[test]
    fn single_inbound_edge_counts_like_any_other() {
        let node = node_with_deps(1);
        assert!(node.dependency_has_completed());
        assert_eq!(node.dep_completed(), 1);
    }

    #[test]
    fn ready_only_on_last_arrival() {
        let node = node_with_deps(3);
        assert!(!node.dependency_has_completed());
        assert!(!node.dependency_has_completed());
        assert!(node.dependency_has_completed());
        assert_eq!(node.dep_completed(), 3);
    }

    #[test]
    fn concurrent_arrivals_produce_exactly_one_winner() {
        const ARRIVALS: usize = 16;

        let node = Arc::new(node_with_deps(ARRIVALS));
        let barrier = Arc::new(Barrier::new(ARRIVALS));

        let handles: Vec<_> = (0..ARRIVALS)
            .map(|_| {
                let node = Arc::clone(&node);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    node.dependency_has_completed()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ready| *ready)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(node.dep_completed(), ARRIVALS);
    }
}
