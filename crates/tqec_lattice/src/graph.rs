//! Lattice graph storage and geometric queries.

use crate::arena::Arena;
use crate::error::LatticeError;
use crate::ids::{EdgeId, LoopId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tqec_common::{Axis, BoundingBox, Kind, Point3};

/// Distance between neighbouring nodes along one axis.
pub const STEP: i32 = 2;

/// The role an edge plays in its loop.
///
/// `Cap` and `Pin` mark where external input/output or state injection
/// attaches to a loop; together they are the "injector" categories.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// An ordinary loop edge.
    Edge,
    /// A qubit line segment.
    Line,
    /// A bridge segment between two defects.
    Bridge,
    /// A capped boundary (initialization or measurement).
    Cap,
    /// An injection pin.
    Pin,
}

impl Category {
    /// Returns `true` for the injector categories (`Cap` and `Pin`).
    pub fn is_injector(self) -> bool {
        matches!(self, Category::Cap | Category::Pin)
    }
}

/// A lattice node. Identity is by position.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    /// Lattice position.
    pub pos: Point3,
    /// Sublattice the node lives on.
    pub kind: Kind,
    /// Loop or net the node currently belongs to, if any.
    pub id: Option<LoopId>,
    /// Incident edges.
    pub edges: Vec<EdgeId>,
}

/// An undirected lattice edge between two neighbouring nodes of the same kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge {
    /// Endpoint handles.
    pub nodes: [NodeId; 2],
    /// Endpoint positions, in the same order as `nodes`.
    pub ends: [Point3; 2],
    /// Axis along which the endpoints differ.
    pub axis: Axis,
    /// Role of the edge in its loop.
    pub category: Category,
    /// Sublattice inherited from the endpoints.
    pub kind: Kind,
    /// Owning loop; `None` marks a transient open segment.
    pub id: Option<LoopId>,
    /// Opposite-kind edges this edge crosses.
    pub cross: Vec<EdgeId>,
}

impl Edge {
    /// The midpoint, which is an integer point since endpoints are 2 units apart.
    pub fn midpoint(&self) -> Point3 {
        midpoint(self.ends[0], self.ends[1])
    }

    /// Returns `true` if the edge carries an injector category.
    pub fn is_injector(&self) -> bool {
        self.category.is_injector()
    }

    /// Returns the endpoint that is not `node`, or `None` if `node` is not an endpoint.
    pub fn opposite(&self, node: NodeId) -> Option<NodeId> {
        match self.nodes {
            [a, b] if a == node => Some(b),
            [a, b] if b == node => Some(a),
            _ => None,
        }
    }
}

/// Midpoint of two lattice points one step apart.
pub fn midpoint(a: Point3, b: Point3) -> Point3 {
    Point3::new((a.x + b.x) / 2, (a.y + b.y) / 2, (a.z + b.z) / 2)
}

/// The node/edge store of one optimization phase.
///
/// Nodes and edges live in slot arenas addressed by stable handles; the
/// position and midpoint indices are rebuilt with [`rebuild_indices`](Self::rebuild_indices)
/// after deserialization.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Graph {
    nodes: Arena<NodeId, Node>,
    edges: Arena<EdgeId, Edge>,
    loop_count: u32,
    #[serde(skip)]
    node_index: HashMap<Point3, NodeId>,
    #[serde(skip)]
    edge_index: HashMap<Point3, EdgeId>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node at `pos`, creating it if the position is empty.
    ///
    /// Fails if the position is off the sublattice of `kind` or already holds
    /// a node of the other kind.
    pub fn add_node(&mut self, pos: Point3, kind: Kind) -> Result<NodeId, LatticeError> {
        if let Some(&id) = self.node_index.get(&pos) {
            let found = self.nodes.get(id).map(|n| n.kind).unwrap_or(kind);
            if found != kind {
                return Err(LatticeError::KindMismatch {
                    pos,
                    expected: kind,
                    found,
                });
            }
            return Ok(id);
        }
        if !Axis::ALL.iter().all(|&a| kind.accepts(pos.get(a))) {
            return Err(LatticeError::OffSublattice { pos, kind });
        }
        let id = self.nodes.alloc(Node {
            pos,
            kind,
            id: None,
            edges: Vec::new(),
        });
        self.node_index.insert(pos, id);
        Ok(id)
    }

    /// Removes a node together with every incident edge.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let incident = self.nodes.get(id)?.edges.clone();
        for edge in incident {
            self.remove_edge(edge);
        }
        let node = self.nodes.remove(id)?;
        self.node_index.remove(&node.pos);
        Some(node)
    }

    /// Adds an edge between two neighbouring nodes of the same kind.
    ///
    /// An edge with a loop id tags both endpoints with it. If the nodes are
    /// already joined, the existing edge is returned unchanged.
    pub fn add_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        category: Category,
        id: Option<LoopId>,
    ) -> Result<EdgeId, LatticeError> {
        let na = self.nodes.get(a).ok_or(LatticeError::UnknownNode(a))?;
        let nb = self.nodes.get(b).ok_or(LatticeError::UnknownNode(b))?;
        let (from, to) = (na.pos, nb.pos);
        if na.kind != nb.kind {
            return Err(LatticeError::MixedKinds { from, to });
        }
        let kind = na.kind;
        let axis = match from.axis_to(to) {
            Some(axis) if (to.get(axis) - from.get(axis)).abs() == STEP => axis,
            _ => return Err(LatticeError::NotUnitStep { from, to }),
        };
        let mid = midpoint(from, to);
        if let Some(&existing) = self.edge_index.get(&mid) {
            return Ok(existing);
        }

        let edge = self.edges.alloc(Edge {
            nodes: [a, b],
            ends: [from, to],
            axis,
            category,
            kind,
            id,
            cross: Vec::new(),
        });
        for n in [a, b] {
            if let Some(node) = self.nodes.get_mut(n) {
                node.edges.push(edge);
                if id.is_some() {
                    node.id = id;
                }
            }
        }
        self.edge_index.insert(mid, edge);
        Ok(edge)
    }

    /// Creates (or reuses) both endpoint nodes and the edge between them.
    pub fn connect(
        &mut self,
        from: Point3,
        to: Point3,
        kind: Kind,
        category: Category,
        id: Option<LoopId>,
    ) -> Result<EdgeId, LatticeError> {
        let a = self.add_node(from, kind)?;
        let b = self.add_node(to, kind)?;
        self.add_edge(a, b, category, id)
    }

    /// Removes an edge, detaching it from its endpoints and its crossing partners.
    ///
    /// Endpoint nodes are kept even if they become isolated; see
    /// [`remove_orphan_nodes`](Self::remove_orphan_nodes).
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(id)?;
        for n in edge.nodes {
            if let Some(node) = self.nodes.get_mut(n) {
                node.edges.retain(|&e| e != id);
            }
        }
        for &partner in &edge.cross {
            if let Some(p) = self.edges.get_mut(partner) {
                p.cross.retain(|&e| e != id);
            }
        }
        self.edge_index.remove(&edge.midpoint());
        Some(edge)
    }

    /// Removes every node without incident edges and returns how many were removed.
    pub fn remove_orphan_nodes(&mut self) -> usize {
        let orphans: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.edges.is_empty())
            .map(|(id, _)| id)
            .collect();
        for &id in &orphans {
            self.remove_node(id);
        }
        orphans.len()
    }

    /// Records that two opposite-kind edges cross. The relation is symmetric.
    pub fn add_cross(&mut self, a: EdgeId, b: EdgeId) -> Result<(), LatticeError> {
        let ka = self.edges.get(a).ok_or(LatticeError::UnknownEdge(a))?.kind;
        let kb = self.edges.get(b).ok_or(LatticeError::UnknownEdge(b))?.kind;
        if ka == kb {
            return Err(LatticeError::SameKindCross(a, b));
        }
        for (this, other) in [(a, b), (b, a)] {
            if let Some(edge) = self.edges.get_mut(this) {
                if !edge.cross.contains(&other) {
                    edge.cross.push(other);
                }
            }
        }
        Ok(())
    }

    /// Removes the crossing relation between two edges, if present.
    pub fn remove_cross(&mut self, a: EdgeId, b: EdgeId) {
        for (this, other) in [(a, b), (b, a)] {
            if let Some(edge) = self.edges.get_mut(this) {
                edge.cross.retain(|&e| e != other);
            }
        }
    }

    /// Returns the node at `pos`, if any.
    pub fn node_at(&self, pos: Point3) -> Option<NodeId> {
        self.node_index.get(&pos).copied()
    }

    /// Returns the edge whose midpoint is `mid`, if any.
    pub fn edge_at(&self, mid: Point3) -> Option<EdgeId> {
        self.edge_index.get(&mid).copied()
    }

    /// Returns the edge joining two nodes, if any.
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.nodes
            .get(a)?
            .edges
            .iter()
            .copied()
            .find(|&e| self.edges.get(e).and_then(|edge| edge.opposite(a)) == Some(b))
    }

    /// Returns the node behind a handle.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Returns the edge behind a handle.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Iterates over live nodes.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Iterates over live edges.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Reassigns an edge (and its endpoints) to a loop.
    pub fn set_edge_id(&mut self, edge: EdgeId, id: Option<LoopId>) -> Result<(), LatticeError> {
        let e = self.edges.get_mut(edge).ok_or(LatticeError::UnknownEdge(edge))?;
        e.id = id;
        let nodes = e.nodes;
        for n in nodes {
            if let Some(node) = self.nodes.get_mut(n) {
                node.id = id;
            }
        }
        Ok(())
    }

    /// Changes an edge's category.
    pub fn set_category(&mut self, edge: EdgeId, category: Category) -> Result<(), LatticeError> {
        let e = self.edges.get_mut(edge).ok_or(LatticeError::UnknownEdge(edge))?;
        e.category = category;
        Ok(())
    }

    /// Returns every edge owned by loop `id`, in handle order.
    pub fn edges_with_id(&self, id: LoopId) -> Vec<EdgeId> {
        self.edges
            .iter()
            .filter(|(_, e)| e.id == Some(id))
            .map(|(eid, _)| eid)
            .collect()
    }

    /// The highest loop id handed out so far.
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Raises the loop counter so ids up to `count` are never handed out again.
    pub fn reserve_loop_ids(&mut self, count: u32) {
        self.loop_count = self.loop_count.max(count);
    }

    /// Allocates a fresh loop id.
    pub fn new_loop_id(&mut self) -> LoopId {
        self.loop_count += 1;
        LoopId::from_raw(self.loop_count)
    }

    /// Bounding box of every node, or `None` for an empty graph.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.nodes.iter().map(|(_, n)| n.pos))
    }

    /// Bounding box of the nodes of one sublattice.
    pub fn kind_bounding_box(&self, kind: Kind) -> Option<BoundingBox> {
        BoundingBox::from_points(
            self.nodes
                .iter()
                .filter(|(_, n)| n.kind == kind)
                .map(|(_, n)| n.pos),
        )
    }

    /// Physical volume of the lattice in primal cells.
    ///
    /// The primal node box is measured in node steps (inclusive on both ends)
    /// and then extended on each side by however far dual geometry sticks out
    /// of it. An empty graph has volume 0.
    pub fn lattice_volume(&self) -> i64 {
        let primal = self.kind_bounding_box(Kind::Primal);
        let dual = self.kind_bounding_box(Kind::Dual);
        let Some(core) = primal.or(dual) else {
            return 0;
        };
        Axis::ALL
            .iter()
            .map(|&a| {
                let mut extent = i64::from((core.max.get(a) - core.min.get(a)) / STEP + 1);
                if let (Some(_), Some(d)) = (primal, dual) {
                    extent += i64::from((d.max.get(a) - core.max.get(a)).max(0) / STEP);
                    extent += i64::from((core.min.get(a) - d.min.get(a)).max(0) / STEP);
                }
                extent
            })
            .product()
    }

    /// Rebuilds the position and midpoint lookup indices from the arenas.
    pub fn rebuild_indices(&mut self) {
        self.node_index = self.nodes.iter().map(|(id, n)| (n.pos, id)).collect();
        self.edge_index = self.edges.iter().map(|(id, e)| (e.midpoint(), id)).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32, z: i32) -> Point3 {
        Point3::new(x, y, z)
    }

    fn id(raw: u32) -> Option<LoopId> {
        Some(LoopId::from_raw(raw))
    }

    #[test]
    fn add_node_is_get_or_create() {
        let mut g = Graph::new();
        let a = g.add_node(p(0, 0, 0), Kind::Primal).unwrap();
        let b = g.add_node(p(0, 0, 0), Kind::Primal).unwrap();
        assert_eq!(a, b);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.node_at(p(0, 0, 0)), Some(a));
    }

    #[test]
    fn add_node_checks_sublattice() {
        let mut g = Graph::new();
        assert!(matches!(
            g.add_node(p(1, 0, 0), Kind::Primal),
            Err(LatticeError::OffSublattice { .. })
        ));
        assert!(g.add_node(p(1, -1, 3), Kind::Dual).is_ok());
    }

    #[test]
    fn add_edge_requires_unit_step() {
        let mut g = Graph::new();
        let a = g.add_node(p(0, 0, 0), Kind::Primal).unwrap();
        let b = g.add_node(p(0, 4, 0), Kind::Primal).unwrap();
        let c = g.add_node(p(2, 2, 0), Kind::Primal).unwrap();
        assert!(matches!(
            g.add_edge(a, b, Category::Edge, id(1)),
            Err(LatticeError::NotUnitStep { .. })
        ));
        assert!(g.add_edge(a, c, Category::Edge, id(1)).is_err());
    }

    #[test]
    fn add_edge_rejects_mixed_kinds() {
        let mut g = Graph::new();
        let a = g.add_node(p(0, 0, 0), Kind::Primal).unwrap();
        let b = g.add_node(p(1, 1, 1), Kind::Dual).unwrap();
        assert!(matches!(
            g.add_edge(a, b, Category::Edge, None),
            Err(LatticeError::MixedKinds { .. })
        ));
    }

    #[test]
    fn edge_lookup_by_midpoint_and_endpoints() {
        let mut g = Graph::new();
        let e = g
            .connect(p(0, 0, 0), p(0, 2, 0), Kind::Primal, Category::Line, id(3))
            .unwrap();
        let edge = g.edge(e).unwrap();
        assert_eq!(edge.axis, Axis::Y);
        assert_eq!(edge.midpoint(), p(0, 1, 0));
        assert_eq!(g.edge_at(p(0, 1, 0)), Some(e));
        assert_eq!(g.edge_at(p(0, 3, 0)), None);
        let a = g.node_at(p(0, 0, 0)).unwrap();
        let b = g.node_at(p(0, 2, 0)).unwrap();
        assert_eq!(g.edge_between(b, a), Some(e));
        // Adding the same edge again is a no-op.
        let again = g.add_edge(b, a, Category::Edge, None).unwrap();
        assert_eq!(again, e);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn remove_node_drops_incident_edges() {
        let mut g = Graph::new();
        g.connect(p(0, 0, 0), p(2, 0, 0), Kind::Primal, Category::Edge, id(1))
            .unwrap();
        g.connect(p(2, 0, 0), p(2, 2, 0), Kind::Primal, Category::Edge, id(1))
            .unwrap();
        let corner = g.node_at(p(2, 0, 0)).unwrap();
        g.remove_node(corner).unwrap();
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.remove_orphan_nodes(), 2);
        assert_eq!(g.node_count(), 0);
        assert!(g.remove_node(corner).is_none());
    }

    #[test]
    fn cross_is_symmetric_and_cleared_on_removal() {
        let mut g = Graph::new();
        let primal = g
            .connect(p(0, 0, 0), p(0, 2, 0), Kind::Primal, Category::Edge, id(1))
            .unwrap();
        let dual = g
            .connect(p(-1, 1, 1), p(1, 1, 1), Kind::Dual, Category::Edge, id(2))
            .unwrap();
        g.add_cross(primal, dual).unwrap();
        g.add_cross(dual, primal).unwrap();
        assert_eq!(g.edge(primal).unwrap().cross, vec![dual]);
        assert_eq!(g.edge(dual).unwrap().cross, vec![primal]);

        g.remove_edge(dual);
        assert!(g.edge(primal).unwrap().cross.is_empty());
    }

    #[test]
    fn cross_requires_opposite_kinds() {
        let mut g = Graph::new();
        let a = g
            .connect(p(0, 0, 0), p(0, 2, 0), Kind::Primal, Category::Edge, id(1))
            .unwrap();
        let b = g
            .connect(p(2, 0, 0), p(2, 2, 0), Kind::Primal, Category::Edge, id(2))
            .unwrap();
        assert_eq!(
            g.add_cross(a, b),
            Err(LatticeError::SameKindCross(a, b))
        );
    }

    #[test]
    fn loop_ids_are_fresh() {
        let mut g = Graph::new();
        g.reserve_loop_ids(4);
        assert_eq!(g.new_loop_id(), LoopId::from_raw(5));
        g.reserve_loop_ids(2);
        assert_eq!(g.new_loop_id(), LoopId::from_raw(6));
    }

    #[test]
    fn set_edge_id_tags_endpoints() {
        let mut g = Graph::new();
        let e = g
            .connect(p(0, 0, 0), p(0, 0, 2), Kind::Primal, Category::Edge, None)
            .unwrap();
        g.set_edge_id(e, id(9)).unwrap();
        assert_eq!(g.edges_with_id(LoopId::from_raw(9)), vec![e]);
        let n = g.node_at(p(0, 0, 2)).unwrap();
        assert_eq!(g.node(n).unwrap().id, id(9));
    }

    #[test]
    fn connect_tags_endpoints_with_the_loop() {
        let mut g = Graph::new();
        g.connect(p(0, 0, 0), p(0, 2, 0), Kind::Primal, Category::Edge, id(4))
            .unwrap();
        g.connect(p(0, 2, 0), p(2, 2, 0), Kind::Primal, Category::Edge, None)
            .unwrap();
        let shared = g.node_at(p(0, 2, 0)).unwrap();
        assert_eq!(g.node(shared).unwrap().id, id(4));
        let open = g.node_at(p(2, 2, 0)).unwrap();
        assert_eq!(g.node(open).unwrap().id, None);
    }

    #[test]
    fn lattice_volume_counts_primal_cells_and_dual_overhang() {
        let mut g = Graph::new();
        g.connect(p(0, 0, 0), p(2, 0, 0), Kind::Primal, Category::Edge, id(1))
            .unwrap();
        assert_eq!(g.lattice_volume(), 2);
        g.connect(p(3, 1, 1), p(5, 1, 1), Kind::Dual, Category::Edge, id(2))
            .unwrap();
        // x grows by one step of overhang; y and z stay within the primal box.
        assert_eq!(g.lattice_volume(), 3);
        assert_eq!(Graph::new().lattice_volume(), 0);
    }

    #[test]
    fn serde_roundtrip_with_rebuilt_indices() {
        let mut g = Graph::new();
        let e = g
            .connect(p(0, 0, 0), p(0, 0, 2), Kind::Primal, Category::Pin, id(1))
            .unwrap();
        let json = serde_json::to_string(&g).unwrap();
        let mut back: Graph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.edge_at(p(0, 0, 1)), None);
        back.rebuild_indices();
        assert_eq!(back.edge_at(p(0, 0, 1)), Some(e));
        assert_eq!(back.edge(e).unwrap().category, Category::Pin);
    }
}
