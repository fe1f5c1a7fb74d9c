//! Control-flow graph of the program under test.
//!
//! This crate holds the structural side of the search: an immutable graph of
//! nodes and edges produced by an external instrumenter, plus the
//! approach-level search used to decide which coverage targets are worth
//! pursuing next.
//!
//! # Module Structure
//!
//! - [`graph`] — Node/edge model, adjacency queries, JSON loading
//! - [`ancestry`] — Backwards best-first search for the nearest covered
//!   ancestor of a node
//!
//! # Determinism
//!
//! Graph queries are deterministic: adjacency lists preserve edge insertion
//! order and the ancestor search breaks ties on node id, so two runs over the
//! same graph always see the same traversal.

pub mod ancestry;
pub mod graph;

pub use ancestry::Ancestor;
pub use graph::{ControlFlowGraph, Edge, GraphError, Node, NodeKind};
