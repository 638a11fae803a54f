//! Sequence-triple encoding of a 3D module arrangement.
//!
//! Three permutations over the module indices fix, for every pair of
//! modules, one axis along which they are separated. Coordinates are
//! recovered by packing each module against the ones already placed.

use crate::module::Module;
use tqec_common::{Axis, Point3};

/// Three permutations of module indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceTriple {
    pub(crate) p1: Vec<usize>,
    pub(crate) p2: Vec<usize>,
    pub(crate) p3: Vec<usize>,
}

/// Which two sequences a shift move edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencePair {
    /// P1 and P2.
    P12,
    /// P1 and P3.
    P13,
    /// P2 and P3.
    P23,
}

impl SequencePair {
    /// All three pairs.
    pub const ALL: [SequencePair; 3] = [SequencePair::P12, SequencePair::P13, SequencePair::P23];
}

fn ranks(seq: &[usize]) -> Vec<usize> {
    let mut rank = vec![0; seq.len()];
    for (pos, &m) in seq.iter().enumerate() {
        rank[m] = pos;
    }
    rank
}

impl SequenceTriple {
    /// Builds the triple from the modules' current positions.
    ///
    /// P3 orders modules by `(z, x)` of their outer box. P1 copies P3; P2 is
    /// P3 sorted by `x` descending, ties broken by `z` ascending.
    pub fn from_modules(modules: &[Module]) -> Self {
        let mut p3: Vec<usize> = (0..modules.len()).collect();
        p3.sort_by_key(|&i| {
            let pos = modules[i].position();
            (pos.z, pos.x)
        });
        let p1 = p3.clone();
        let mut p2 = p3.clone();
        p2.sort_by(|&a, &b| {
            let (pa, pb) = (modules[a].position(), modules[b].position());
            pb.x.cmp(&pa.x).then(pa.z.cmp(&pb.z))
        });
        Self { p1, p2, p3 }
    }

    /// Number of modules encoded.
    pub fn len(&self) -> usize {
        self.p3.len()
    }

    /// Returns `true` for an empty triple.
    pub fn is_empty(&self) -> bool {
        self.p3.is_empty()
    }

    /// Packs every module against those placed before it in P3 order.
    ///
    /// For an earlier module `j` and the target `t`:
    /// `j` is left of `t` when `j` is at or after `t` in P2;
    /// below `t` when after it in P1 and before it in P2;
    /// in front of `t` when before it in both P1 and P2.
    /// Each coordinate is the furthest far face among the modules on that
    /// side, measured from `origin`.
    pub fn recalculate(&self, modules: &mut [Module], origin: Point3) {
        let rank1 = ranks(&self.p1);
        let rank2 = ranks(&self.p2);
        let mut offset = vec![Point3::ORIGIN; modules.len()];
        let mut placed: Vec<usize> = Vec::with_capacity(modules.len());

        for &t in &self.p3 {
            let mut at = Point3::ORIGIN;
            for &j in &placed {
                let axis = if rank2[j] > rank2[t] {
                    Axis::X
                } else if rank1[j] > rank1[t] {
                    Axis::Y
                } else {
                    Axis::Z
                };
                let reach = offset[j].get(axis) + modules[j].size().get(axis);
                if reach > at.get(axis) {
                    at = at.with(axis, reach);
                }
            }
            offset[t] = at;
            modules[t].set_position(origin + at);
            placed.push(t);
        }
    }

    /// Swaps two modules in all three sequences.
    pub fn swap(&mut self, a: usize, b: usize) {
        for seq in [&mut self.p1, &mut self.p2, &mut self.p3] {
            for m in seq.iter_mut() {
                if *m == a {
                    *m = b;
                } else if *m == b {
                    *m = a;
                }
            }
        }
    }

    /// Moves module `m` to index `first` in one sequence and `second` in the other.
    pub fn shift(&mut self, m: usize, pair: SequencePair, first: usize, second: usize) {
        let (s1, s2) = match pair {
            SequencePair::P12 => (&mut self.p1, &mut self.p2),
            SequencePair::P13 => (&mut self.p1, &mut self.p3),
            SequencePair::P23 => (&mut self.p2, &mut self.p3),
        };
        for (seq, at) in [(s1, first), (s2, second)] {
            seq.retain(|&x| x != m);
            let at = at.min(seq.len());
            seq.insert(at, m);
        }
    }
}
