//! Loops: the maximal edge sets sharing one positive id.

use crate::graph::Graph;
use crate::ids::{EdgeId, LoopId};
use std::collections::{BTreeMap, BTreeSet};
use tqec_common::{BoundingBox, Kind};

/// One closed defect, derived from a [`Graph`].
///
/// A `Loop` is a view: it holds handles into the graph and must be
/// re-collected after the graph changes underneath it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Loop {
    /// The loop id shared by all its edges.
    pub id: LoopId,
    /// Sublattice of the loop's edges.
    pub kind: Kind,
    /// Every edge of the loop, in handle order.
    pub edges: Vec<EdgeId>,
    /// Distinct ids of the loops this loop crosses.
    pub cross: BTreeSet<LoopId>,
    /// Edges of this loop carrying an injector category.
    pub injectors: Vec<EdgeId>,
}

impl Loop {
    /// Collects loop `id` from the graph, or `None` if it owns no edges.
    pub fn collect(graph: &Graph, id: LoopId) -> Option<Loop> {
        let edges = graph.edges_with_id(id);
        let kind = graph.edge(*edges.first()?)?.kind;
        let mut cross = BTreeSet::new();
        let mut injectors = Vec::new();
        for &e in &edges {
            let Some(edge) = graph.edge(e) else { continue };
            if edge.is_injector() {
                injectors.push(e);
            }
            for &partner in &edge.cross {
                match graph.edge(partner).and_then(|p| p.id) {
                    Some(other) if other != id => {
                        cross.insert(other);
                    }
                    _ => {}
                }
            }
        }
        Some(Loop {
            id,
            kind,
            edges,
            cross,
            injectors,
        })
    }

    /// Bounding box of the loop's endpoints.
    pub fn bounding_box(&self, graph: &Graph) -> Option<BoundingBox> {
        BoundingBox::from_points(
            self.edges
                .iter()
                .filter_map(|&e| graph.edge(e))
                .flat_map(|edge| edge.ends),
        )
    }

    /// Edges of this loop that cross an edge of loop `other`.
    pub fn edges_crossing(&self, graph: &Graph, other: LoopId) -> Vec<EdgeId> {
        self.edges
            .iter()
            .copied()
            .filter(|&e| {
                graph.edge(e).is_some_and(|edge| {
                    edge.cross
                        .iter()
                        .any(|&p| graph.edge(p).and_then(|pe| pe.id) == Some(other))
                })
            })
            .collect()
    }
}

impl Graph {
    /// Collects every loop in the graph, keyed by id.
    pub fn loops(&self) -> BTreeMap<LoopId, Loop> {
        let ids: BTreeSet<LoopId> = self.edges().filter_map(|(_, e)| e.id).collect();
        ids.into_iter()
            .filter_map(|id| Loop::collect(self, id).map(|l| (id, l)))
            .collect()
    }
}
