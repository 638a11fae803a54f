//! Connector allocation: which net id each cross port receives.
//!
//! After placement, joints of different modules may coincide. Joints that are
//! linked (by a cross edge, or by sitting at the same position) form a
//! *chain* that will become one physical wire, so every cross edge in a chain
//! must carry the same id. Each module may hand out each id only as often as
//! its own cross edges carried it in the input lattice.
//!
//! Allocation doubles as the placer's feasibility oracle: a layout whose
//! chains cannot all be given a common id is rejected.

use crate::module::Module;
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tqec_common::Point3;
use tqec_lattice::LoopId;

/// A cross edge, addressed by module index and cross-edge index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PortRef {
    /// Index into the module list.
    pub module: usize,
    /// Index into that module's cross edges.
    pub cross: usize,
}

/// Cross edges that must share one id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chain {
    /// Member cross edges, sorted.
    pub members: Vec<PortRef>,
    /// The id given to every member.
    pub id: LoopId,
    /// Free ends of the chain (joint positions touched an odd number of times), sorted.
    pub endpoints: Vec<Point3>,
}

/// The result of a successful allocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Allocation {
    /// Every chain, multi-member chains first.
    pub chains: Vec<Chain>,
}

impl Allocation {
    /// Writes the chosen ids into the modules' cross edges.
    pub fn apply(&self, modules: &mut [Module]) {
        for chain in &self.chains {
            for port in &chain.members {
                if let Some(m) = modules.get_mut(port.module) {
                    m.assign(port.cross, chain.id);
                }
            }
        }
    }
}

/// Groups cross edges into chains with a union-find over all joints.
fn find_chains(modules: &[Module]) -> Vec<Vec<PortRef>> {
    let mut offsets = Vec::with_capacity(modules.len());
    let mut total = 0;
    for m in modules {
        offsets.push(total);
        total += m.joints().len();
    }

    let mut uf = UnionFind::<usize>::new(total);
    let mut by_pos: HashMap<Point3, usize> = HashMap::new();
    for (mi, m) in modules.iter().enumerate() {
        let base = offsets[mi];
        for (ji, joint) in m.joints().iter().enumerate() {
            let idx = base + ji;
            match by_pos.get(&joint.pos) {
                Some(&first) => {
                    uf.union(first, idx);
                }
                None => {
                    by_pos.insert(joint.pos, idx);
                }
            }
        }
        for c in m.cross_edges() {
            uf.union(base + c.joints[0], base + c.joints[1]);
        }
    }

    let mut groups: BTreeMap<usize, Vec<PortRef>> = BTreeMap::new();
    for (mi, m) in modules.iter().enumerate() {
        for (ci, c) in m.cross_edges().iter().enumerate() {
            let root = uf.find(offsets[mi] + c.joints[0]);
            groups
                .entry(root)
                .or_default()
                .push(PortRef { module: mi, cross: ci });
        }
    }

    let mut chains: Vec<Vec<PortRef>> = groups.into_values().collect();
    for members in &mut chains {
        members.sort();
    }
    chains.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
    chains
}

fn chain_endpoints(modules: &[Module], members: &[PortRef]) -> Vec<Point3> {
    let mut degree: BTreeMap<Point3, usize> = BTreeMap::new();
    for port in members {
        let (a, b, _) = match modules[port.module].joint_pairs().nth(port.cross) {
            Some(pair) => pair,
            None => continue,
        };
        *degree.entry(a.pos).or_insert(0) += 1;
        *degree.entry(b.pos).or_insert(0) += 1;
    }
    degree
        .into_iter()
        .filter(|&(_, d)| d % 2 == 1)
        .map(|(p, _)| p)
        .collect()
}

/// Ids both joints of a cross edge may take.
fn joint_candidates(module: &Module, cross: usize) -> BTreeSet<LoopId> {
    match module.joint_pairs().nth(cross) {
        Some((a, b, _)) => a.candidates.intersection(&b.candidates).copied().collect(),
        None => BTreeSet::new(),
    }
}

/// Assigns an id to every chain, or returns `None` if the layout is infeasible.
///
/// Chains are processed largest first. A multi-member chain takes an id that
/// every participating module still has enough copies of and that every
/// member joint accepts, preferring the members' common input net and
/// otherwise the smallest such id. Single cross edges prefer their own input
/// net. The ids taken are removed from each module's pool.
pub fn allocate(modules: &[Module]) -> Option<Allocation> {
    let mut pools: Vec<BTreeMap<LoopId, usize>> = modules.iter().map(Module::net_pool).collect();
    let mut allocation = Allocation::default();

    for members in find_chains(modules) {
        let mut uses: BTreeMap<usize, usize> = BTreeMap::new();
        for port in &members {
            *uses.entry(port.module).or_insert(0) += 1;
        }

        let mut candidates: Option<BTreeSet<LoopId>> = None;
        for (&m, &count) in &uses {
            let available: BTreeSet<LoopId> = pools[m]
                .iter()
                .filter(|&(_, &left)| left >= count)
                .map(|(&id, _)| id)
                .collect();
            candidates = Some(match candidates {
                Some(c) => c.intersection(&available).copied().collect(),
                None => available,
            });
        }
        let mut candidates = candidates.unwrap_or_default();
        for port in &members {
            let accepted = joint_candidates(&modules[port.module], port.cross);
            candidates.retain(|id| accepted.contains(id));
        }

        let nets: BTreeSet<LoopId> = members
            .iter()
            .map(|p| modules[p.module].cross_edges()[p.cross].net)
            .collect();
        let preferred = match nets.iter().next() {
            Some(&net) if nets.len() == 1 && candidates.contains(&net) => Some(net),
            _ => None,
        };
        let id = preferred.or_else(|| candidates.iter().next().copied())?;

        for (&m, &count) in &uses {
            if let Some(left) = pools[m].get_mut(&id) {
                *left -= count;
            }
        }
        let endpoints = chain_endpoints(modules, &members);
        allocation.chains.push(Chain {
            members,
            id,
            endpoints,
        });
    }

    Some(allocation)
}

/// Returns `true` if the current layout admits a consistent allocation.
pub fn is_feasible(modules: &[Module]) -> bool {
    allocate(modules).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::tests::{column_module, p, square_module};

    fn lid(raw: u32) -> LoopId {
        LoopId::from_raw(raw)
    }

    #[test]
    fn isolated_ports_keep_their_net() {
        let modules = vec![
            square_module(1, 0, 0, Some(7)),
            square_module(2, 10, 0, Some(8)),
        ];
        let alloc = allocate(&modules).unwrap();
        assert_eq!(alloc.chains.len(), 2);
        assert!(alloc.chains.iter().all(|c| c.members.len() == 1));
        assert_eq!(alloc.chains[0].id, lid(7));
        assert_eq!(alloc.chains[1].id, lid(8));
        assert_eq!(alloc.chains[0].endpoints, vec![p(-1, 1, 1), p(1, 1, 1)]);
    }

    #[test]
    fn coincident_joints_form_one_chain() {
        let modules = vec![
            square_module(1, 0, 0, Some(7)),
            square_module(2, 2, 0, Some(7)),
        ];
        let alloc = allocate(&modules).unwrap();
        assert_eq!(alloc.chains.len(), 1);
        let chain = &alloc.chains[0];
        assert_eq!(chain.members.len(), 2);
        assert_eq!(chain.id, lid(7));
        assert_eq!(chain.endpoints, vec![p(-1, 1, 1), p(3, 1, 1)]);
    }

    #[test]
    fn disjoint_pools_are_infeasible() {
        let modules = vec![
            square_module(1, 0, 0, Some(5)),
            square_module(2, 2, 0, Some(6)),
        ];
        assert!(allocate(&modules).is_none());
        assert!(!is_feasible(&modules));
    }

    #[test]
    fn shared_id_is_taken_from_both_pools() {
        // Module 1 carries nets 5 and 6; its net-5 port touches module 2's net-6 port.
        let mut modules = vec![column_module(1, 0, 0, &[5, 6]), square_module(2, 2, 0, Some(6))];
        let alloc = allocate(&modules).unwrap();
        assert_eq!(alloc.chains.len(), 2);
        assert_eq!(alloc.chains[0].members.len(), 2);
        assert_eq!(alloc.chains[0].id, lid(6));
        assert_eq!(alloc.chains[1].id, lid(5));

        alloc.apply(&mut modules);
        let mut ids: Vec<LoopId> = (0..2).filter_map(|i| modules[0].cross_id(i)).collect();
        ids.sort();
        assert_eq!(ids, vec![lid(5), lid(6)]);
        assert_eq!(modules[1].cross_id(0), Some(lid(6)));
    }
}
