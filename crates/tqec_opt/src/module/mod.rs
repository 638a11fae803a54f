//! Modules: rigid placement units built from one loop each.
//!
//! A [`Module`] owns a copy of its loop's geometry (the *frame*) plus the
//! opposite-kind segments that thread through it (the *cross edges*). Each
//! cross edge ends in two [`Joint`]s; the pair is the port where another
//! net enters and leaves the module. Modules are the unit of truth between
//! placement and routing; a fresh graph is rebuilt from them afterwards.

mod builder;
mod rebuild;

pub use builder::{build_modules, ModuleSet};
pub use rebuild::rebuild_graph;

use std::collections::{BTreeMap, BTreeSet};
use tqec_common::{Axis, BoundingBox, Kind, Point3};
use tqec_lattice::{Category, LoopId};

/// One edge of a module's frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameEdge {
    /// Endpoint positions.
    pub ends: [Point3; 2],
    /// Category carried over from the lattice.
    pub category: Category,
}

/// A port node of a module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Joint {
    /// World position.
    pub pos: Point3,
    /// Ids this port may legally be assigned.
    pub candidates: BTreeSet<LoopId>,
}

/// An opposite-kind segment threading a module, joining two of its joints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrossEdge {
    /// Indices into the module's joint list (the joint pair).
    pub joints: [usize; 2],
    /// Id of the net the segment belonged to in the input lattice.
    pub net: LoopId,
    /// Category carried over from the lattice.
    pub category: Category,
    /// Indices of the frame edges this segment crossed in the input lattice.
    pub crosses: Vec<usize>,
    /// Id chosen by the connector allocator.
    pub assigned: Option<LoopId>,
}

/// A relocatable unit: one loop's frame plus its cross ports.
#[derive(Clone, Debug)]
pub struct Module {
    id: LoopId,
    kind: Kind,
    frame: Vec<FrameEdge>,
    joints: Vec<Joint>,
    cross: Vec<CrossEdge>,
    inner: BoundingBox,
    outer: BoundingBox,
}

/// A cross segment handed to [`Module::new`].
#[derive(Clone, Debug)]
pub struct CrossSegment {
    /// Endpoint positions.
    pub ends: [Point3; 2],
    /// Owning net.
    pub net: LoopId,
    /// Category of the segment.
    pub category: Category,
    /// Indices of crossed frame edges.
    pub crosses: Vec<usize>,
}

impl Module {
    /// Builds a module from a frame and the segments threading it.
    ///
    /// Returns `None` for an empty frame. Joints are shared between segments
    /// that meet at the same position. Every joint starts with the same
    /// candidate set: the nets that thread this module plus `crossed`, the
    /// loops the frame is known to cross.
    pub fn new(
        id: LoopId,
        kind: Kind,
        frame: Vec<FrameEdge>,
        segments: Vec<CrossSegment>,
        crossed: &BTreeSet<LoopId>,
    ) -> Option<Self> {
        let frame_box = BoundingBox::from_points(frame.iter().flat_map(|e| e.ends))?;

        let mut candidates = crossed.clone();
        candidates.extend(segments.iter().map(|s| s.net));

        let mut joints: Vec<Joint> = Vec::new();
        let mut cross = Vec::with_capacity(segments.len());
        for seg in segments {
            let mut idx = [0; 2];
            for (slot, pos) in idx.iter_mut().zip(seg.ends) {
                *slot = match joints.iter().position(|j| j.pos == pos) {
                    Some(i) => i,
                    None => {
                        joints.push(Joint {
                            pos,
                            candidates: candidates.clone(),
                        });
                        joints.len() - 1
                    }
                };
            }
            cross.push(CrossEdge {
                joints: idx,
                net: seg.net,
                category: seg.category,
                crosses: seg.crosses,
                assigned: None,
            });
        }

        let inner = frame_box.padded(1);
        let mut module = Self {
            id,
            kind,
            frame,
            joints,
            cross,
            inner,
            outer: inner,
        };
        module.update_boxes();
        Some(module)
    }

    fn update_boxes(&mut self) {
        if let Some(frame_box) = BoundingBox::from_points(self.frame.iter().flat_map(|e| e.ends)) {
            self.inner = frame_box.padded(1);
        }
        self.outer = self
            .joints
            .iter()
            .fold(self.inner, |bb, j| bb.including(j.pos));
    }

    /// The loop this module was built from.
    pub fn id(&self) -> LoopId {
        self.id
    }

    /// Sublattice of the frame.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Frame edges.
    pub fn frame(&self) -> &[FrameEdge] {
        &self.frame
    }

    /// Port joints.
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Cross edges.
    pub fn cross_edges(&self) -> &[CrossEdge] {
        &self.cross
    }

    /// Iterates over joint pairs: both joints of each cross edge with the edge itself.
    pub fn joint_pairs(&self) -> impl Iterator<Item = (&Joint, &Joint, &CrossEdge)> {
        self.cross
            .iter()
            .map(|c| (&self.joints[c.joints[0]], &self.joints[c.joints[1]], c))
    }

    /// Frame box padded by one unit; routes may not enter its interior.
    pub fn inner(&self) -> BoundingBox {
        self.inner
    }

    /// Inner box grown to include every joint; the box used for packing.
    pub fn outer(&self) -> BoundingBox {
        self.outer
    }

    /// Minimum corner of the outer box.
    pub fn position(&self) -> Point3 {
        self.outer.min
    }

    /// Extent of the outer box.
    pub fn size(&self) -> Point3 {
        self.outer.size()
    }

    /// Moves every piece of geometry by `delta`.
    pub fn translate(&mut self, delta: Point3) {
        for edge in &mut self.frame {
            edge.ends = edge.ends.map(|p| p + delta);
        }
        for joint in &mut self.joints {
            joint.pos = joint.pos + delta;
        }
        self.inner = self.inner.translated(delta);
        self.outer = self.outer.translated(delta);
    }

    /// Moves the module so its outer box starts at `min`.
    ///
    /// The displacement must be even on every axis to keep lattice parity.
    pub fn set_position(&mut self, min: Point3) {
        let delta = min - self.outer.min;
        debug_assert!(
            Axis::ALL.iter().all(|&a| delta.get(a) % 2 == 0),
            "odd displacement {delta} breaks lattice parity"
        );
        self.translate(delta);
    }

    /// Rotates the module 90 degrees about `axis` through its outer-box center.
    ///
    /// Returns `false` and leaves the module untouched if any rotated node
    /// would land off its sublattice.
    pub fn rotate(&mut self, axis: Axis) -> bool {
        let center = self.outer.center_doubled();
        let turn = |p: Point3, kind: Kind| -> Option<Point3> {
            let q = (center + (p.doubled() - center).rotated(axis)).halved()?;
            Axis::ALL
                .iter()
                .all(|&a| kind.accepts(q.get(a)))
                .then_some(q)
        };

        let joint_kind = self.kind.opposite();
        let mut frame = Vec::with_capacity(self.frame.len());
        for edge in &self.frame {
            let [a, b] = edge.ends;
            let (Some(a), Some(b)) = (turn(a, self.kind), turn(b, self.kind)) else {
                return false;
            };
            frame.push([a, b]);
        }
        let mut joints = Vec::with_capacity(self.joints.len());
        for joint in &self.joints {
            let Some(pos) = turn(joint.pos, joint_kind) else {
                return false;
            };
            joints.push(pos);
        }

        for (edge, ends) in self.frame.iter_mut().zip(frame) {
            edge.ends = ends;
        }
        for (joint, pos) in self.joints.iter_mut().zip(joints) {
            joint.pos = pos;
        }
        self.update_boxes();
        true
    }

    /// Multiset of the input-lattice nets of this module's cross edges.
    pub fn net_pool(&self) -> BTreeMap<LoopId, usize> {
        let mut pool = BTreeMap::new();
        for c in &self.cross {
            *pool.entry(c.net).or_insert(0) += 1;
        }
        pool
    }

    /// Records the allocator's choice for cross edge `index`.
    pub fn assign(&mut self, index: usize, id: LoopId) {
        if let Some(c) = self.cross.get_mut(index) {
            c.assigned = Some(id);
        }
    }

    /// Id of cross edge `index` after allocation, falling back to its input net.
    pub fn cross_id(&self, index: usize) -> Option<LoopId> {
        self.cross.get(index).map(|c| c.assigned.unwrap_or(c.net))
    }
}
