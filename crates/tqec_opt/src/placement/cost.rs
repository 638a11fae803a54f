//! Placement cost functions.
//!
//! The primary term is the surface area of the box enclosing every module,
//! which rewards compact layouts. The secondary term measures how far apart
//! modules that share a net sit, normalized to `[0, 1]` and scaled by a
//! weight below one, so it only breaks ties between equally compact layouts.

use crate::module::Module;
use std::collections::BTreeMap;
use tqec_common::BoundingBox;
use tqec_lattice::LoopId;

/// Weights for the placement cost function components.
#[derive(Debug, Clone)]
pub struct PlacementCost {
    /// Weight for the union surface area.
    pub weight_surface: f64,
    /// Relative weight of the shared-net distance term.
    pub weight_nets: f64,
}

impl Default for PlacementCost {
    fn default() -> Self {
        Self {
            weight_surface: 1.0,
            weight_nets: 0.1,
        }
    }
}

impl PlacementCost {
    /// Cost with the configured shared-net weight.
    pub fn with_net_weight(weight_nets: f64) -> Self {
        Self {
            weight_nets,
            ..Self::default()
        }
    }

    /// Computes the total placement cost of the current module positions.
    ///
    /// `pairs` lists module index pairs that share a net; see [`shared_net_pairs`].
    pub fn total_cost(&self, modules: &[Module], pairs: &[(usize, usize)]) -> f64 {
        let Some(bbox) = union_box(modules) else {
            return 0.0;
        };
        let surface = bbox.surface_area() as f64;
        let spread = net_spread(modules, pairs, &bbox);
        surface * self.weight_surface * (1.0 + self.weight_nets * spread)
    }
}

/// Box enclosing every module's outer box.
pub fn union_box(modules: &[Module]) -> Option<BoundingBox> {
    let mut iter = modules.iter().map(Module::outer);
    let first = iter.next()?;
    Some(iter.fold(first, BoundingBox::union))
}

/// Every pair of modules that carried a cross edge of the same input net.
///
/// A pair appears once per net it shares.
pub fn shared_net_pairs(modules: &[Module]) -> Vec<(usize, usize)> {
    let mut members: BTreeMap<LoopId, Vec<usize>> = BTreeMap::new();
    for (i, m) in modules.iter().enumerate() {
        for net in m.net_pool().into_keys() {
            members.entry(net).or_default().push(i);
        }
    }
    let mut pairs = Vec::new();
    for list in members.values() {
        for (k, &a) in list.iter().enumerate() {
            for &b in &list[k + 1..] {
                pairs.push((a, b));
            }
        }
    }
    pairs
}

/// Mean center distance over `pairs`, divided by the diagonal of `bbox`.
fn net_spread(modules: &[Module], pairs: &[(usize, usize)], bbox: &BoundingBox) -> f64 {
    let diagonal = bbox.diagonal();
    if pairs.is_empty() || diagonal <= 0.0 {
        return 0.0;
    }
    let total: f64 = pairs
        .iter()
        .map(|&(a, b)| {
            let ca = modules[a].outer().center_doubled();
            let cb = modules[b].outer().center_doubled();
            (ca.distance_squared(cb) as f64).sqrt() / 2.0
        })
        .sum();
    total / (pairs.len() as f64 * diagonal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::tests::{p, square_module};

    #[test]
    fn surface_only_without_shared_nets() {
        let modules = vec![square_module(1, 0, 0, None), square_module(2, 2, 0, None)];
        let cost = PlacementCost::default();
        // Union box is 4 x 4 x 4.
        assert_eq!(cost.total_cost(&modules, &[]), 96.0);
        assert!(shared_net_pairs(&modules).is_empty());
    }

    #[test]
    fn shared_nets_add_a_bounded_penalty() {
        let near = vec![square_module(1, 0, 0, Some(5)), square_module(2, 2, 0, Some(5))];
        let pairs = shared_net_pairs(&near);
        assert_eq!(pairs, vec![(0, 1)]);

        let cost = PlacementCost::default();
        let c = cost.total_cost(&near, &pairs);
        assert!(c > 96.0);
        assert!(c <= 96.0 * 1.1);
    }

    #[test]
    fn spread_grows_with_distance() {
        let cost = PlacementCost::with_net_weight(0.5);
        let mut modules = vec![square_module(1, 0, 0, Some(5)), square_module(2, 2, 0, Some(5))];
        let pairs = shared_net_pairs(&modules);
        let bbox = union_box(&modules).unwrap();
        let close = net_spread(&modules, &pairs, &bbox);
        modules[1].set_position(p(21, -1, -1));
        let bbox = union_box(&modules).unwrap();
        let far = net_spread(&modules, &pairs, &bbox);
        assert!(far > close);
        assert!(far <= 1.0);
        assert!(cost.total_cost(&modules, &pairs) > 0.0);
    }

    #[test]
    fn empty_layout_costs_nothing() {
        assert_eq!(PlacementCost::default().total_cost(&[], &[]), 0.0);
        assert!(union_box(&[]).is_none());
    }
}
