//! Opaque ID newtypes for lattice entities.
//!
//! [`NodeId`] and [`EdgeId`] are arena handles into a [`Graph`](crate::Graph)
//! and are never reused after removal. [`LoopId`] names a loop or net; it is
//! always positive, and "no loop" is spelled `Option<LoopId>::None`.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` value.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` value.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Handle of a node in a lattice graph.
    NodeId
);

define_id!(
    /// Handle of an edge in a lattice graph.
    EdgeId
);

define_id!(
    /// Positive identifier of a loop (before placement) or a net (after allocation).
    LoopId
);
