//! The two complementary TQEC sublattices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which sublattice a node or edge lives on.
///
/// Primal geometry sits on even lattice coordinates, dual geometry on odd
/// ones. A crossing between a primal and a dual edge encodes a logical
/// interaction between the two defects.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// The primal sublattice (even coordinates).
    Primal,
    /// The dual sublattice (odd coordinates).
    Dual,
}

impl Kind {
    /// Returns the complementary sublattice.
    pub fn opposite(self) -> Kind {
        match self {
            Kind::Primal => Kind::Dual,
            Kind::Dual => Kind::Primal,
        }
    }

    /// Returns the coordinate parity of this sublattice (0 for primal, 1 for dual).
    pub fn parity(self) -> i32 {
        match self {
            Kind::Primal => 0,
            Kind::Dual => 1,
        }
    }

    /// Returns `true` if `value` has this sublattice's parity.
    pub fn accepts(self, value: i32) -> bool {
        value.rem_euclid(2) == self.parity()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Primal => write!(f, "primal"),
            Kind::Dual => write!(f, "dual"),
        }
    }
}
