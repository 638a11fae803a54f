//! The two loop-merging rewrite rules.

use super::Rewrite;
use crate::error::OptError;
use crate::routing::{materialize, RoutingGrid};
use crate::{codes, routing};
use tqec_common::{BoundingBox, InternalError, Kind, Point3, TqecResult};
use tqec_diagnostics::{Diagnostic, DiagnosticSink};
use tqec_lattice::{Category, EdgeId, Graph, Loop, LoopId};

/// Picks the edge an injector should move onto: the deepest (largest
/// midpoint `z`), then left-most (smallest `x`, then `y`) non-injector edge.
pub fn injector_site(graph: &Graph, edges: &[EdgeId]) -> Option<EdgeId> {
    edges
        .iter()
        .filter_map(|&e| graph.edge(e).map(|edge| (e, edge)))
        .filter(|(_, edge)| !edge.is_injector())
        .min_by_key(|(_, edge)| {
            let m = edge.midpoint();
            (-m.z, m.x, m.y)
        })
        .map(|(e, _)| e)
}

/// Rule A precondition: one crossing partner, one injector, and a partner
/// edge that can take the injector.
///
/// A partner whose edges are all injectors already has no free site, and
/// sliding onto it would erase the injector's category. Such a loop is left
/// in place.
pub(crate) fn injector_pass_through(graph: &Graph, lp: &Loop) -> Option<(LoopId, EdgeId)> {
    if lp.cross.len() != 1 || lp.injectors.len() != 1 {
        return None;
    }
    let partner = *lp.cross.iter().next()?;
    let target = injector_site(graph, &graph.edges_with_id(partner))?;
    Some((partner, target))
}

/// Rule B precondition: two crossing partners, no injector, and exactly one
/// edge of each partner crossing the loop. Returns the partners with their
/// crossing edge, lower id first.
pub(crate) fn bridge(graph: &Graph, lp: &Loop) -> Option<[(LoopId, EdgeId); 2]> {
    if lp.cross.len() != 2 || !lp.injectors.is_empty() {
        return None;
    }
    let mut found = Vec::with_capacity(2);
    for &partner in &lp.cross {
        let other = Loop::collect(graph, partner)?;
        match other.edges_crossing(graph, lp.id).as_slice() {
            [e] => found.push((partner, *e)),
            _ => return None,
        }
    }
    match found.as_slice() {
        [a, b] => Some([*a, *b]),
        _ => None,
    }
}

fn delete_loop(graph: &mut Graph, lp: &Loop) {
    for &e in &lp.edges {
        graph.remove_edge(e);
    }
    graph.remove_orphan_nodes();
}

fn injector_category(graph: &Graph, lp: &Loop) -> TqecResult<Category> {
    lp.injectors
        .first()
        .and_then(|&e| graph.edge(e))
        .map(|e| e.category)
        .ok_or_else(|| InternalError::new(format!("loop {} lost its injector", lp.id)))
}

/// Slides the single injector of `lp` onto `target` of `partner` and deletes `lp`.
pub(crate) fn apply_injector_pass_through(
    graph: &mut Graph,
    lp: &Loop,
    partner: LoopId,
    target: EdgeId,
) -> Result<Rewrite, OptError> {
    let category = injector_category(graph, lp)?;
    graph.set_category(target, category)?;

    for &e in &lp.edges {
        let crossing: Vec<EdgeId> = graph
            .edge(e)
            .map(|edge| {
                edge.cross
                    .iter()
                    .copied()
                    .filter(|&c| graph.edge(c).and_then(|ce| ce.id) == Some(partner))
                    .collect()
            })
            .unwrap_or_default();
        for c in crossing {
            graph.remove_cross(e, c);
        }
    }
    delete_loop(graph, lp);

    Ok(Rewrite::InjectorPassThrough {
        removed: lp.id,
        partner,
        category,
    })
}

/// Keep-out boxes for wires of `wire_kind`: the padded boxes of every
/// remaining loop of the other kind.
fn loop_keep_out(graph: &Graph, wire_kind: Kind) -> Vec<BoundingBox> {
    graph
        .loops()
        .values()
        .filter(|l| l.kind != wire_kind)
        .filter_map(|l| l.bounding_box(graph))
        .map(|b| b.padded(1))
        .collect()
}

fn reconnect(
    graph: &mut Graph,
    kind: Kind,
    net: LoopId,
    from: Point3,
    to: Point3,
    margin: i32,
    sink: &DiagnosticSink,
) -> Result<(), OptError> {
    let grid = RoutingGrid::from_graph(graph, kind, None, loop_keep_out(graph, kind), margin);
    let Some(path) = routing::shortest_path(&grid, from, to) else {
        sink.emit(
            Diagnostic::error(
                codes::no_route(),
                format!("cannot reconnect loop {net} from {from} to {to} after bridge elimination"),
            )
            .at(from),
        );
        return Err(OptError::NoRoute { net, from, to });
    };
    materialize(graph, kind, net, &path)?;
    Ok(())
}

/// Removes bridge `lp`, merges its two partners and reconnects them.
///
/// The partner edges that crossed the bridge are deleted, the second partner
/// takes the first one's id, and the freed ends are joined pairwise by two
/// new wires: the first end of the first edge goes to the nearer end of the
/// second edge (ties to its first end), the other ends are joined after.
pub(crate) fn apply_bridge(
    graph: &mut Graph,
    lp: &Loop,
    partners: [(LoopId, EdgeId); 2],
    margin: i32,
    sink: &DiagnosticSink,
) -> Result<Rewrite, OptError> {
    let [(kept, e1), (merged, e2)] = partners;
    let missing = |e: EdgeId| tqec_common::InternalError::new(format!("bridge edge {e} vanished"));
    let edge1 = graph.edge(e1).ok_or_else(|| missing(e1))?;
    let kind = edge1.kind;
    let [a1, b1] = edge1.ends;
    let [a2, b2] = graph.edge(e2).ok_or_else(|| missing(e2))?.ends;

    graph.remove_edge(e1);
    graph.remove_edge(e2);
    for e in graph.edges_with_id(merged) {
        graph.set_edge_id(e, Some(kept))?;
    }
    delete_loop(graph, lp);

    let (first, second) = if a1.manhattan(a2) <= a1.manhattan(b2) {
        (a2, b2)
    } else {
        (b2, a2)
    };
    reconnect(graph, kind, kept, a1, first, margin, sink)?;
    reconnect(graph, kind, kept, b1, second, margin, sink)?;

    Ok(Rewrite::BridgeElimination {
        removed: lp.id,
        kept,
        merged,
    })
}
