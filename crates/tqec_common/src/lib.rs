//! Shared foundational types used across the TQEC lattice optimizer.
//!
//! This crate provides the integer lattice geometry ([`Point3`], [`Axis`],
//! [`BoundingBox`]), the primal/dual sublattice [`Kind`], and the common
//! internal result type.

#![warn(missing_docs)]

pub mod geom;
pub mod kind;
pub mod result;

pub use geom::{Axis, BoundingBox, Point3};
pub use kind::Kind;
pub use result::{InternalError, TqecResult};
