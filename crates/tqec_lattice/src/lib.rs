//! The defect lattice graph: nodes, edges, and loops.
//!
//! A [`Graph`] owns every [`Node`] and [`Edge`] of one optimization phase in
//! handle-addressed arenas. Nodes are unique by position, edges by midpoint.
//! Edges that share a positive [`LoopId`] form a [`Loop`], one closed defect.
//!
//! Coordinate lookups ([`Graph::node_at`], [`Graph::edge_at`]) return
//! `None` for empty positions; callers may query speculative positions freely.

#![warn(missing_docs)]

pub mod arena;
pub mod error;
pub mod graph;
pub mod ids;
pub mod loops;

pub use arena::{Arena, ArenaId};
pub use error::LatticeError;
pub use graph::{midpoint, Category, Edge, Graph, Node, STEP};
pub use ids::{EdgeId, LoopId, NodeId};
pub use loops::Loop;
