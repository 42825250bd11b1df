// src/dag/mod.rs

//! In-memory DAG representation.
//!
//! - [`edge`] holds the immutable `from -> to` links.
//! - [`node`] holds a unit of work plus its dependency counter and the
//!   readiness check used during traversal.
//! - [`graph`] is the arena that owns all nodes and edges of a flow.

pub mod edge;
pub mod graph;
pub mod node;

pub use edge::{Edge, EdgeId};
pub use graph::Graph;
pub use node::{Node, NodeId};
