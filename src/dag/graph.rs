// src/dag/graph.rs

use crate::dag::edge::{Edge, EdgeId};
use crate::dag::node::{Node, NodeId};
use crate::engine::Runnable;

/// Arena owning every node and edge of one flow.
///
/// Nodes refer to edges (and edges to nodes) by index, so the graph can be
/// shared read-only across traversal branches once construction is over.
/// No cycle detection happens here; an acyclic graph is the caller's
/// responsibility.
#[derive(Debug)]
pub struct Graph<P> {
    nodes: Vec<Node<P>>,
    edges: Vec<Edge>,
}

impl<P> Default for Graph<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Graph<P> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Add a node running `task`.
    pub fn new_node(&mut self, task: impl Runnable<P> + 'static) -> NodeId {
        self.push_node(Some(Box::new(task)))
    }

    /// Add a node without a task; it only propagates to its children.
    pub fn new_empty_node(&mut self) -> NodeId {
        self.push_node(None)
    }

    pub(crate) fn push_node(&mut self, task: Option<Box<dyn Runnable<P>>>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(task));
        id
    }

    pub(crate) fn set_label(&mut self, id: NodeId, label: impl Into<String>) {
        self.nodes[id.index()].label = Some(label.into());
    }

    /// Link `from -> to`: the edge becomes an outbound edge of `from` and an
    /// inbound edge of `to`.
    ///
    /// Panics if either id does not belong to this graph.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> EdgeId {
        assert!(from.index() < self.nodes.len(), "unknown source {from}");
        assert!(to.index() < self.nodes.len(), "unknown target {to}");

        let id = EdgeId(self.edges.len());
        self.edges.push(Edge { from, to });
        self.nodes[from.index()].children.push(id);
        self.nodes[to.index()].dependency.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node<P> {
        &self.nodes[id.index()]
    }

    pub fn edge(&self, id: EdgeId) -> Edge {
        self.edges[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Human-readable name for logs: the label if present, else the id.
    pub fn display_name(&self, id: NodeId) -> String {
        match self.nodes[id.index()].label() {
            Some(label) => label.to_string(),
            None => id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_edge_registers_both_endpoints() {
        let mut graph: Graph<()> = Graph::new();
        let a = graph.new_empty_node();
        let b = graph.new_node(|_: &()| {});
        let c = graph.new_empty_node();

        let ab = graph.add_edge(a, b);
        let ac = graph.add_edge(a, c);
        let bc = graph.add_edge(b, c);

        assert_eq!(graph.edge_count(), 3);
        assert_eq!((a.index(), b.index(), c.index()), (0, 1, 2));
        assert_eq!(bc.index(), 2);
        assert_eq!(graph.node(a).children(), &[ab, ac]);
        assert!(graph.node(a).dependency().is_empty());
        assert_eq!(graph.node(c).dependency(), &[ac, bc]);
        assert_eq!(graph.edge(bc), Edge { from: b, to: c });
        assert!(graph.node(b).has_task());
        assert!(!graph.node(c).has_task());
    }

    #[test]
    fn every_edge_is_referenced_exactly_twice() {
        let mut graph: Graph<()> = Graph::new();
        let nodes: Vec<_> = (0..4).map(|_| graph.new_empty_node()).collect();
        graph.add_edge(nodes[0], nodes[1]);
        graph.add_edge(nodes[0], nodes[2]);
        graph.add_edge(nodes[1], nodes[3]);
        graph.add_edge(nodes[2], nodes[3]);

        for (idx, edge) in graph.edges().iter().enumerate() {
            let id = EdgeId(idx);
            let outbound = nodes
                .iter()
                .filter(|n| graph.node(**n).children().contains(&id))
                .count();
            let inbound = nodes
                .iter()
                .filter(|n| graph.node(**n).dependency().contains(&id))
                .count();
            assert_eq!((outbound, inbound), (1, 1));
            assert!(graph.node(edge.from).children().contains(&id));
            assert!(graph.node(edge.to).dependency().contains(&id));
        }
    }

    #[test]
    fn display_name_prefers_label() {
        let mut graph: Graph<()> = Graph::new();
        let a = graph.new_empty_node();
        let b = graph.new_empty_node();
        graph.set_label(b, "compile");

        assert_eq!(graph.display_name(a), "node#0");
        assert_eq!(graph.display_name(b), "compile");
    }
}
