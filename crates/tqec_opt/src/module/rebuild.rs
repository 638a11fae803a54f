//! Reconstruction of a lattice graph from placed modules.

use super::Module;
use tqec_lattice::{Graph, LatticeError};

/// Builds a fresh graph holding every module's frame and cross edges.
///
/// Frame edges keep their module's loop id; cross edges take their
/// allocated id. Joints at the same position collapse into one node, and
/// recorded frame crossings are restored as cross-references. Loop ids up to
/// `loop_count` stay reserved.
pub fn rebuild_graph(modules: &[Module], loop_count: u32) -> Result<Graph, LatticeError> {
    let mut graph = Graph::new();
    graph.reserve_loop_ids(loop_count);

    for module in modules {
        let mut frame_ids = Vec::with_capacity(module.frame().len());
        for edge in module.frame() {
            let [a, b] = edge.ends;
            frame_ids.push(graph.connect(a, b, module.kind(), edge.category, Some(module.id()))?);
        }
        for (index, (ja, jb, cross)) in module.joint_pairs().enumerate() {
            let id = module.cross_id(index);
            let edge = graph.connect(ja.pos, jb.pos, module.kind().opposite(), cross.category, id)?;
            for &f in &cross.crosses {
                if let Some(&frame_edge) = frame_ids.get(f) {
                    graph.add_cross(edge, frame_edge)?;
                }
            }
        }
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::tests::{p, square_module};
    use tqec_lattice::LoopId;

    #[test]
    fn rebuild_restores_frames_ports_and_crossings() {
        let mut a = square_module(1, 0, 0, Some(7));
        a.assign(0, LoopId::from_raw(9));
        let b = square_module(2, 10, 0, None);
        let g = rebuild_graph(&[a, b], 9).unwrap();

        assert_eq!(g.edge_count(), 9);
        assert_eq!(g.edges_with_id(LoopId::from_raw(1)).len(), 4);
        assert_eq!(g.edges_with_id(LoopId::from_raw(2)).len(), 4);
        let port = g.edge_at(p(0, 1, 1)).unwrap();
        assert_eq!(g.edge(port).unwrap().id, Some(LoopId::from_raw(9)));
        assert_eq!(g.edge(port).unwrap().cross.len(), 1);
        assert_eq!(g.loop_count(), 9);
    }

    #[test]
    fn shared_joints_collapse() {
        let a = square_module(1, 0, 0, Some(7));
        let mut b = square_module(2, 10, 0, Some(7));
        b.set_position(p(1, -1, -1));
        let g = rebuild_graph(&[a, b], 7).unwrap();
        let shared = g.node_at(p(1, 1, 1)).unwrap();
        assert_eq!(g.node(shared).unwrap().edges.len(), 2);
    }
}
