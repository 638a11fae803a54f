//! The static routing grid of one sublattice.

use std::collections::HashSet;
use tqec_common::{Axis, BoundingBox, Kind, Point3};
use tqec_lattice::{midpoint, Graph, STEP};

/// Cells and steps a new wire of one kind may use.
///
/// A cell is free when it lies inside the bounds, holds no existing node,
/// and is not strictly inside a keep-out box. A step is allowed when its
/// midpoint is not the midpoint of an existing edge and not strictly inside
/// a keep-out box. The search destination is always enterable as a cell,
/// but the step into it must still be allowed.
#[derive(Clone, Debug)]
pub struct RoutingGrid {
    kind: Kind,
    bounds: BoundingBox,
    occupied: HashSet<Point3>,
    walls: HashSet<Point3>,
    keep_out: Vec<BoundingBox>,
}

impl RoutingGrid {
    /// An empty grid over `bounds`.
    pub fn new(kind: Kind, bounds: BoundingBox) -> Self {
        Self {
            kind,
            bounds,
            occupied: HashSet::new(),
            walls: HashSet::new(),
            keep_out: Vec::new(),
        }
    }

    /// A grid blocked by every node and edge of `graph` and by `keep_out`.
    ///
    /// The bounds cover `extent` and the graph, padded by `margin`.
    pub fn from_graph(
        graph: &Graph,
        kind: Kind,
        extent: Option<BoundingBox>,
        keep_out: Vec<BoundingBox>,
        margin: i32,
    ) -> Self {
        let base = match (extent, graph.bounding_box()) {
            (Some(a), Some(b)) => a.union(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => BoundingBox::point(Point3::ORIGIN),
        };
        let mut grid = Self::new(kind, base.padded(margin));
        for (_, node) in graph.nodes() {
            grid.occupied.insert(node.pos);
        }
        for (_, edge) in graph.edges() {
            grid.walls.insert(edge.midpoint());
        }
        grid.keep_out = keep_out;
        grid
    }

    /// Sublattice the grid routes on.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Searchable volume.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Marks a cell as occupied.
    pub fn occupy(&mut self, cell: Point3) {
        self.occupied.insert(cell);
    }

    /// Forbids the step whose midpoint is `mid`.
    pub fn wall(&mut self, mid: Point3) {
        self.walls.insert(mid);
    }

    /// Adds a box whose interior no wire may enter.
    pub fn keep_out(&mut self, bbox: BoundingBox) {
        self.keep_out.push(bbox);
    }

    fn in_keep_out(&self, p: Point3) -> bool {
        self.keep_out.iter().any(|b| b.contains_strict(p))
    }

    /// Returns `true` if a wire may pass through `cell`.
    pub fn is_free(&self, cell: Point3) -> bool {
        self.bounds.contains(cell)
            && Axis::ALL.iter().all(|&a| self.kind.accepts(cell.get(a)))
            && !self.occupied.contains(&cell)
            && !self.in_keep_out(cell)
    }

    /// Returns `true` if the unit step `from -> to` may be taken towards `dst`.
    pub fn step_allowed(&self, from: Point3, to: Point3, dst: Point3) -> bool {
        let mid = midpoint(from, to);
        if self.walls.contains(&mid) || self.in_keep_out(mid) {
            return false;
        }
        to == dst || self.is_free(to)
    }

    /// Unit steps out of `from`, excluding a U-turn back to `parent`.
    pub fn neighbors(
        &self,
        from: Point3,
        parent: Option<Point3>,
        dst: Point3,
    ) -> impl Iterator<Item = (Point3, Axis)> + '_ {
        Axis::ALL
            .into_iter()
            .flat_map(move |axis| [STEP, -STEP].map(|d| (from.offset(axis, d), axis)))
            .filter(move |&(to, _)| Some(to) != parent && self.step_allowed(from, to, dst))
    }
}
