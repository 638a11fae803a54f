//! Topological reduction of the defect lattice.
//!
//! Dangling geometry is pruned first. Then two rewrite rules are applied
//! until neither matches:
//!
//! - **injector pass-through**: a loop crossing exactly one other loop and
//!   owning exactly one injector hands the injector to its partner and
//!   disappears;
//! - **bridge elimination**: an injector-free loop crossing exactly two
//!   others is removed and its partners are merged into one loop, joined by
//!   two new wires.
//!
//! Pass-through always wins over bridge elimination, and among matching
//! loops the smallest id goes first. Only loops touched by a rewrite are
//! re-examined afterwards.

mod rules;

pub use rules::injector_site;

use crate::codes;
use crate::error::OptError;
use serde::Serialize;
use std::collections::BTreeSet;
use tqec_config::RouteConfig;
use tqec_diagnostics::{Diagnostic, DiagnosticSink};
use tqec_lattice::{Category, EdgeId, Graph, Loop, LoopId};
use tracing::debug;

/// One applied rewrite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Rewrite {
    /// A single-crossing loop moved its injector onto its partner.
    InjectorPassThrough {
        /// The deleted loop.
        removed: LoopId,
        /// The loop that received the injector.
        partner: LoopId,
        /// The injector category moved.
        category: Category,
    },
    /// A two-crossing bridge was removed and its partners merged.
    BridgeElimination {
        /// The deleted bridge.
        removed: LoopId,
        /// The partner whose id survives.
        kept: LoopId,
        /// The partner absorbed into `kept`.
        merged: LoopId,
    },
}

/// Statistics of one reduction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReduceReport {
    /// Edges without a loop id that were deleted.
    pub pruned_edges: usize,
    /// Nodes left without edges that were deleted.
    pub pruned_nodes: usize,
    /// Loops after pruning, before any rewrite.
    pub loops_before: usize,
    /// Loops remaining at the fixed point.
    pub loops_after: usize,
    /// Rewrites in application order.
    pub rewrites: Vec<Rewrite>,
}

/// Deletes every edge without a loop id, then every node left without edges.
///
/// Returns the number of edges and nodes removed.
pub fn prune(graph: &mut Graph) -> (usize, usize) {
    let open: Vec<EdgeId> = graph
        .edges()
        .filter(|(_, e)| e.id.is_none())
        .map(|(id, _)| id)
        .collect();
    for &e in &open {
        graph.remove_edge(e);
    }
    (open.len(), graph.remove_orphan_nodes())
}

/// Loops whose rule preconditions currently hold.
#[derive(Debug, Default)]
struct Worklist {
    pass_through: BTreeSet<LoopId>,
    bridge: BTreeSet<LoopId>,
}

impl Worklist {
    fn refresh(&mut self, graph: &Graph, id: LoopId) {
        self.pass_through.remove(&id);
        self.bridge.remove(&id);
        let Some(lp) = Loop::collect(graph, id) else {
            return;
        };
        if rules::injector_pass_through(graph, &lp).is_some() {
            self.pass_through.insert(id);
        } else if rules::bridge(graph, &lp).is_some() {
            self.bridge.insert(id);
        }
    }

    fn next(&self) -> Option<LoopId> {
        self.pass_through
            .first()
            .or_else(|| self.bridge.first())
            .copied()
    }
}

/// Reduces `graph` in place to a fixed point of the rewrite rules.
///
/// `config.margin` pads the search volume used to reconnect merged loops.
/// A reconnection with no path is fatal.
pub fn reduce(
    graph: &mut Graph,
    config: &RouteConfig,
    sink: &DiagnosticSink,
) -> Result<ReduceReport, OptError> {
    let (pruned_edges, pruned_nodes) = prune(graph);
    let loops = graph.loops();
    let mut report = ReduceReport {
        pruned_edges,
        pruned_nodes,
        loops_before: loops.len(),
        ..ReduceReport::default()
    };

    let mut work = Worklist::default();
    for &id in loops.keys() {
        work.refresh(graph, id);
    }

    while let Some(id) = work.next() {
        let Some(lp) = Loop::collect(graph, id) else {
            work.refresh(graph, id);
            continue;
        };

        let mut touched: BTreeSet<LoopId> = lp.cross.clone();
        touched.insert(id);
        let rewrite = if let Some((partner, target)) = rules::injector_pass_through(graph, &lp) {
            rules::apply_injector_pass_through(graph, &lp, partner, target)?
        } else if let Some(partners) = rules::bridge(graph, &lp) {
            for (partner, _) in partners {
                if let Some(other) = Loop::collect(graph, partner) {
                    touched.extend(other.cross);
                }
            }
            rules::apply_bridge(graph, &lp, partners, config.margin, sink)?
        } else {
            work.refresh(graph, id);
            continue;
        };

        debug!(?rewrite, "applied rewrite");
        report.rewrites.push(rewrite);
        for t in touched {
            work.refresh(graph, t);
        }
    }

    report.loops_after = graph.loops().len();
    sink.emit(Diagnostic::note(
        codes::reduce_summary(),
        format!(
            "reduced {} loops to {} with {} rewrites ({} open edges pruned)",
            report.loops_before,
            report.loops_after,
            report.rewrites.len(),
            report.pruned_edges
        ),
    ));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tqec_common::{Kind, Point3};

    fn p(x: i32, y: i32, z: i32) -> Point3 {
        Point3::new(x, y, z)
    }

    fn lid(raw: u32) -> LoopId {
        LoopId::from_raw(raw)
    }

    fn ring(g: &mut Graph, kind: Kind, corners: &[Point3], id: u32) -> Vec<EdgeId> {
        let mut edges = Vec::new();
        for i in 0..corners.len() {
            let (a, b) = (corners[i], corners[(i + 1) % corners.len()]);
            let steps = a.manhattan(b) / 2;
            let axis = a.axis_to(b).unwrap();
            let dir = if b.get(axis) > a.get(axis) { 2 } else { -2 };
            let mut at = a;
            for _ in 0..steps {
                let next = at.offset(axis, dir);
                edges.push(
                    g.connect(at, next, kind, Category::Edge, Some(lid(id)))
                        .unwrap(),
                );
                at = next;
            }
        }
        edges
    }

    #[test]
    fn prune_removes_open_segments() {
        let mut g = Graph::new();
        ring(&mut g, Kind::Primal, &[p(0, 0, 0), p(0, 2, 0), p(0, 2, 2), p(0, 0, 2)], 1);
        g.connect(p(4, 0, 0), p(6, 0, 0), Kind::Primal, Category::Edge, None)
            .unwrap();
        assert_eq!(prune(&mut g), (1, 2));
        assert_eq!(g.edge_count(), 4);
    }

    #[test]
    fn pass_through_moves_the_pin() {
        let mut g = Graph::new();
        let b = ring(&mut g, Kind::Primal, &[p(0, 0, 0), p(0, 2, 0), p(0, 2, 2), p(0, 0, 2)], 1);
        let a = ring(&mut g, Kind::Dual, &[p(-1, 1, 1), p(1, 1, 1), p(1, 1, 5), p(-1, 1, 5)], 2);
        g.set_category(a[2], Category::Pin).unwrap();
        g.add_cross(a[0], b[0]).unwrap();

        let sink = DiagnosticSink::new();
        let report = reduce(&mut g, &RouteConfig::default(), &sink).unwrap();
        assert_eq!(report.loops_before, 2);
        assert_eq!(report.loops_after, 1);
        assert_eq!(
            report.rewrites,
            vec![Rewrite::InjectorPassThrough {
                removed: lid(2),
                partner: lid(1),
                category: Category::Pin,
            }]
        );
        let loops = g.loops();
        let survivor = &loops[&lid(1)];
        assert_eq!(survivor.injectors.len(), 1);
        assert!(survivor.cross.is_empty());
        assert_eq!(g.edge_count(), 4);
        assert_eq!(sink.diagnostics().len(), 1);
    }

    #[test]
    fn bridge_elimination_merges_partners() {
        let mut g = Graph::new();
        let c1 = ring(&mut g, Kind::Primal, &[p(0, 0, 0), p(0, 2, 0), p(0, 2, 2), p(0, 0, 2)], 1);
        let c2 = ring(&mut g, Kind::Primal, &[p(0, 0, 6), p(0, 2, 6), p(0, 2, 8), p(0, 0, 8)], 2);
        let l = ring(&mut g, Kind::Dual, &[p(-1, 1, 1), p(1, 1, 1), p(1, 1, 7), p(-1, 1, 7)], 3);
        // c1[2] is (0,2,2)-(0,0,2); c2[0] is (0,0,6)-(0,2,6).
        g.add_cross(c1[2], l[1]).unwrap();
        g.add_cross(c2[0], l[2]).unwrap();

        let sink = DiagnosticSink::new();
        let report = reduce(&mut g, &RouteConfig::default(), &sink).unwrap();
        assert_eq!(
            report.rewrites,
            vec![Rewrite::BridgeElimination {
                removed: lid(3),
                kept: lid(1),
                merged: lid(2),
            }]
        );
        assert_eq!(report.loops_after, 1);
        assert_eq!(g.edges_with_id(lid(1)).len(), 10);
        assert!(g.edges_with_id(lid(2)).is_empty());
        for (_, node) in g.nodes() {
            assert_eq!(node.kind, Kind::Primal);
            assert_eq!(node.edges.len(), 2);
        }
    }

    #[test]
    fn unrelated_loops_are_a_fixed_point() {
        let mut g = Graph::new();
        ring(&mut g, Kind::Primal, &[p(0, 0, 0), p(0, 2, 0), p(0, 2, 2), p(0, 0, 2)], 1);
        ring(&mut g, Kind::Primal, &[p(10, 0, 0), p(10, 2, 0), p(10, 2, 2), p(10, 0, 2)], 2);
        let sink = DiagnosticSink::new();
        let report = reduce(&mut g, &RouteConfig::default(), &sink).unwrap();
        assert!(report.rewrites.is_empty());
        assert_eq!(report.loops_before, 2);
        assert_eq!(report.loops_after, 2);
    }
}
