//! Errors raised by lattice graph mutations.

use crate::ids::{EdgeId, NodeId};
use tqec_common::{Kind, Point3};

/// A mutation that would leave the lattice geometrically invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LatticeError {
    /// A node position does not have its sublattice's coordinate parity.
    #[error("{kind} node at {pos} is off its sublattice")]
    OffSublattice {
        /// The rejected position.
        pos: Point3,
        /// The requested sublattice.
        kind: Kind,
    },

    /// A position already holds a node of the other sublattice.
    #[error("position {pos} already holds a {found} node, not {expected}")]
    KindMismatch {
        /// The contested position.
        pos: Point3,
        /// The sublattice the caller asked for.
        expected: Kind,
        /// The sublattice already present.
        found: Kind,
    },

    /// Edge endpoints are not one lattice step (2 units along one axis) apart.
    #[error("edge {from} -> {to} is not a single lattice step")]
    NotUnitStep {
        /// First endpoint.
        from: Point3,
        /// Second endpoint.
        to: Point3,
    },

    /// Edge endpoints lie on different sublattices.
    #[error("edge {from} -> {to} joins a primal and a dual node")]
    MixedKinds {
        /// First endpoint.
        from: Point3,
        /// Second endpoint.
        to: Point3,
    },

    /// Cross-references may only link edges of opposite sublattices.
    #[error("edges {0} and {1} are on the same sublattice and cannot cross")]
    SameKindCross(EdgeId, EdgeId),

    /// A node handle does not refer to a live node.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// An edge handle does not refer to a live edge.
    #[error("unknown edge {0}")]
    UnknownEdge(EdgeId),
}
