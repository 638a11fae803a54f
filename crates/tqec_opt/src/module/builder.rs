//! Decomposition of a reduced lattice into modules.

use super::{CrossSegment, FrameEdge, Module};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tqec_common::{BoundingBox, Kind};
use tqec_lattice::{midpoint, Category, EdgeId, Graph, LoopId};

/// The modules of one phase plus what the decomposition left outside them.
#[derive(Clone, Debug, Default)]
pub struct ModuleSet {
    /// One module per loop of the phase's kind, in loop-id order.
    pub modules: Vec<Module>,
    /// Opposite-kind nets with no segment inside any module.
    pub orphan_nets: Vec<LoopId>,
    /// Injector categories found on opposite-kind edges outside every module, per net.
    pub outside_injectors: BTreeMap<LoopId, Vec<Category>>,
}

/// Builds one module per loop of `kind`.
///
/// A module's cross edges are the opposite-kind edges whose midpoint lies
/// strictly inside its inner box. Loops without edges produce no module.
pub fn build_modules(graph: &Graph, kind: Kind) -> ModuleSet {
    let others: Vec<(EdgeId, LoopId)> = graph
        .edges()
        .filter(|(_, e)| e.kind != kind)
        .filter_map(|(id, e)| e.id.map(|net| (id, net)))
        .collect();

    let mut set = ModuleSet::default();
    let mut captured: HashSet<EdgeId> = HashSet::new();

    for (id, lp) in graph.loops() {
        if lp.kind != kind {
            continue;
        }
        let mut frame = Vec::with_capacity(lp.edges.len());
        let mut frame_index: HashMap<EdgeId, usize> = HashMap::new();
        for &e in &lp.edges {
            let Some(edge) = graph.edge(e) else { continue };
            frame_index.insert(e, frame.len());
            frame.push(FrameEdge {
                ends: edge.ends,
                category: edge.category,
            });
        }
        let Some(frame_box) = BoundingBox::from_points(frame.iter().flat_map(|f| f.ends)) else {
            continue;
        };
        let inner = frame_box.padded(1);

        let mut segments = Vec::new();
        for &(e, net) in &others {
            let Some(edge) = graph.edge(e) else { continue };
            if !inner.contains_strict(edge.midpoint()) {
                continue;
            }
            captured.insert(e);
            segments.push(CrossSegment {
                ends: edge.ends,
                net,
                category: edge.category,
                crosses: edge
                    .cross
                    .iter()
                    .filter_map(|p| frame_index.get(p).copied())
                    .collect(),
            });
        }

        link_crossed_nets(&mut segments, &frame, &lp.cross);

        if let Some(module) = Module::new(id, kind, frame, segments, &lp.cross) {
            set.modules.push(module);
        }
    }

    let mut seen: BTreeSet<LoopId> = BTreeSet::new();
    let mut ported: BTreeSet<LoopId> = BTreeSet::new();
    for &(e, net) in &others {
        seen.insert(net);
        if captured.contains(&e) {
            ported.insert(net);
            continue;
        }
        if let Some(edge) = graph.edge(e) {
            if edge.is_injector() {
                set.outside_injectors
                    .entry(net)
                    .or_default()
                    .push(edge.category);
            }
        }
    }
    set.orphan_nets = seen.difference(&ported).copied().collect();

    set
}

/// Makes sure every net the loop crosses keeps one crossing inside the module.
///
/// A previous phase may have left the cross-reference on an edge that lies
/// outside the frame's inner box. For such a net, the captured segment
/// closest to the frame is linked to its nearest frame edge.
fn link_crossed_nets(
    segments: &mut [CrossSegment],
    frame: &[FrameEdge],
    crossed: &BTreeSet<LoopId>,
) {
    for &net in crossed {
        if segments.iter().any(|s| s.net == net && !s.crosses.is_empty()) {
            continue;
        }
        let nearest = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.net == net)
            .flat_map(|(si, s)| {
                let mid = midpoint(s.ends[0], s.ends[1]);
                frame.iter().enumerate().map(move |(fi, f)| {
                    (mid.manhattan(midpoint(f.ends[0], f.ends[1])), si, fi)
                })
            })
            .min();
        if let Some((_, si, fi)) = nearest {
            segments[si].crosses.push(fi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tqec_common::Point3;

    fn p(x: i32, y: i32, z: i32) -> Point3 {
        Point3::new(x, y, z)
    }

    fn lid(raw: u32) -> Option<LoopId> {
        Some(LoopId::from_raw(raw))
    }

    /// Primal square at x=0 (loop 1) threaded by a dual rectangle (loop 2)
    /// that carries a pin outside the square.
    fn threaded_square() -> Graph {
        let mut g = Graph::new();
        let c = [p(0, 0, 0), p(0, 2, 0), p(0, 2, 2), p(0, 0, 2)];
        let mut frame = Vec::new();
        for i in 0..4 {
            frame.push(
                g.connect(c[i], c[(i + 1) % 4], Kind::Primal, Category::Edge, lid(1))
                    .unwrap(),
            );
        }
        let d = [p(-1, 1, 1), p(1, 1, 1), p(1, 1, 3), p(1, 1, 5), p(-1, 1, 5), p(-1, 1, 3)];
        let mut dual = Vec::new();
        for i in 0..d.len() {
            let cat = if i == 3 { Category::Pin } else { Category::Edge };
            dual.push(
                g.connect(d[i], d[(i + 1) % d.len()], Kind::Dual, cat, lid(2))
                    .unwrap(),
            );
        }
        g.add_cross(frame[0], dual[0]).unwrap();
        g.reserve_loop_ids(2);
        g
    }

    #[test]
    fn builds_one_module_with_one_port() {
        let g = threaded_square();
        let set = build_modules(&g, Kind::Primal);
        assert_eq!(set.modules.len(), 1);
        let m = &set.modules[0];
        assert_eq!(m.id(), LoopId::from_raw(1));
        assert_eq!(m.frame().len(), 4);
        assert_eq!(m.cross_edges().len(), 1);
        assert_eq!(m.cross_edges()[0].crosses, vec![0]);
        assert_eq!(m.joints()[0].pos, p(-1, 1, 1));
        assert!(m.joints()[0].candidates.contains(&LoopId::from_raw(2)));
        assert!(set.orphan_nets.is_empty());
        assert_eq!(
            set.outside_injectors.get(&LoopId::from_raw(2)),
            Some(&vec![Category::Pin])
        );
    }

    #[test]
    fn dual_phase_sees_primal_segments() {
        let g = threaded_square();
        let set = build_modules(&g, Kind::Dual);
        assert_eq!(set.modules.len(), 1);
        // The dual rectangle spans x in [-1, 1]; its padded box strictly
        // contains the primal edges at x = 0 with z in (0, 6).
        assert!(!set.modules[0].cross_edges().is_empty());
    }

    #[test]
    fn crossing_outside_the_inner_box_is_relinked() {
        let mut g = threaded_square();
        // Move the reference onto a dual edge far from the frame.
        let near = g.edge_at(p(0, 1, 1)).unwrap();
        let far = g.edge_at(p(1, 1, 4)).unwrap();
        let frame_edge = g.edge(near).unwrap().cross[0];
        g.remove_cross(near, frame_edge);
        g.add_cross(far, frame_edge).unwrap();

        let set = build_modules(&g, Kind::Primal);
        let m = &set.modules[0];
        let linked: Vec<_> = m.cross_edges().iter().filter(|c| !c.crosses.is_empty()).collect();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].net, LoopId::from_raw(2));
        assert_eq!(m.frame()[linked[0].crosses[0]].ends, [p(0, 0, 0), p(0, 2, 0)]);
    }

    #[test]
    fn unported_nets_are_reported() {
        let mut g = threaded_square();
        g.connect(p(21, 1, 1), p(23, 1, 1), Kind::Dual, Category::Edge, lid(3))
            .unwrap();
        let set = build_modules(&g, Kind::Primal);
        assert_eq!(set.orphan_nets, vec![LoopId::from_raw(3)]);
    }
}
