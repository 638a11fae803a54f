//! Neighborhood moves for the annealer.

use super::sequence_triple::{SequencePair, SequenceTriple};
use crate::module::Module;
use rand::Rng;
use tqec_common::Axis;

/// Attempts at finding a parity-preserving rotation before giving up.
const ROTATION_TRIES: usize = 16;

/// A proposed change to the layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Move {
    /// Two modules trade places in all three sequences.
    Swap(usize, usize),
    /// One module is reinserted in two of the sequences.
    Shift {
        /// The module moved.
        module: usize,
        /// The two sequences edited.
        pair: SequencePair,
        /// New index in the first sequence of the pair.
        first: usize,
        /// New index in the second sequence of the pair.
        second: usize,
    },
    /// One module turned 90 degrees about an axis.
    Rotate(usize, Axis),
}

/// Result of drawing and applying one move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Proposal {
    /// The move that was applied, or `None` if every rotation draw was rejected.
    pub applied: Option<Move>,
    /// Rotation draws rejected for breaking lattice parity.
    pub rejected_rotations: usize,
}

/// Draws one move uniformly from swap, shift and rotate, and applies it.
///
/// Swaps and shifts edit the triple only; a rotation edits the module in
/// place. Requires at least two modules.
pub fn propose(
    rng: &mut impl Rng,
    triple: &mut SequenceTriple,
    modules: &mut [Module],
) -> Proposal {
    let n = modules.len();
    match rng.gen_range(0..3) {
        0 => {
            let a = rng.gen_range(0..n);
            let mut b = rng.gen_range(0..n - 1);
            if b >= a {
                b += 1;
            }
            triple.swap(a, b);
            Proposal {
                applied: Some(Move::Swap(a, b)),
                rejected_rotations: 0,
            }
        }
        1 => {
            let module = rng.gen_range(0..n);
            let pair = SequencePair::ALL[rng.gen_range(0..3)];
            let first = rng.gen_range(0..n);
            let second = rng.gen_range(0..n);
            triple.shift(module, pair, first, second);
            Proposal {
                applied: Some(Move::Shift {
                    module,
                    pair,
                    first,
                    second,
                }),
                rejected_rotations: 0,
            }
        }
        _ => {
            let mut rejected = 0;
            for _ in 0..ROTATION_TRIES {
                let module = rng.gen_range(0..n);
                let axis = Axis::ALL[rng.gen_range(0..3)];
                if modules[module].rotate(axis) {
                    return Proposal {
                        applied: Some(Move::Rotate(module, axis)),
                        rejected_rotations: rejected,
                    };
                }
                rejected += 1;
            }
            Proposal {
                applied: None,
                rejected_rotations: rejected,
            }
        }
    }
}

/// Turns a rotated module back by rotating it three more times.
pub fn undo_rotation(modules: &mut [Module], mv: Move) {
    if let Move::Rotate(module, axis) = mv {
        for _ in 0..3 {
            let turned = modules[module].rotate(axis);
            debug_assert!(turned, "inverse rotation must preserve parity");
        }
    }
}
