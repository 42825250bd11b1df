// src/dag/edge.rs

//! Directed dependency links between nodes.

use std::fmt;

use crate::dag::node::NodeId;

/// Index of an [`Edge`] inside its owning [`Graph`](crate::dag::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) usize);

impl EdgeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge#{}", self.0)
    }
}

/// An immutable link `from -> to`.
///
/// Edges are created once at construction time and never change. The id of an
/// edge is stored in exactly two places: the `children` of `from` and the
/// `dependency` list of `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}
