//! Simulated annealing over sequence triples.
//!
//! Starting from the compacted initial layout, repeatedly proposes a swap,
//! shift or rotation, re-packs the modules, and accepts or rejects the result
//! using the Metropolis criterion. Layouts the connector allocator cannot
//! label are rolled back before their cost is looked at. The temperature
//! decreases geometrically; the best layout seen is what the caller gets back.

use super::cost::PlacementCost;
use super::moves::{self, Move};
use super::sequence_triple::SequenceTriple;
use super::PlacementReport;
use crate::allocation;
use crate::module::Module;
use rand::Rng;
use tqec_common::Point3;
use tqec_config::AnnealConfig;
use tracing::{debug, trace};

/// Metropolis acceptance test.
///
/// A move that does not increase cost is always accepted without touching
/// the random stream; a worsening move is accepted with probability
/// `exp(-delta / temperature)`.
pub fn metropolis_accept(delta: f64, temperature: f64, rng: &mut impl Rng) -> bool {
    delta <= 0.0 || rng.gen::<f64>() < (-delta / temperature).exp()
}

/// Refines a feasible, already-compacted layout in place.
///
/// `origin` is the corner the triple packs against and `pairs` the shared-net
/// module pairs used by the cost. On return the modules hold the best layout
/// found.
pub(crate) fn simulated_annealing(
    modules: &mut [Module],
    triple: &mut SequenceTriple,
    origin: Point3,
    pairs: &[(usize, usize)],
    config: &AnnealConfig,
    rng: &mut impl Rng,
) -> PlacementReport {
    let cost_fn = PlacementCost::with_net_weight(config.net_weight);
    let mut current_cost = cost_fn.total_cost(modules, pairs);
    let mut report = PlacementReport {
        initial_cost: current_cost,
        final_cost: current_cost,
        converged: true,
        ..PlacementReport::default()
    };
    if modules.len() < 2 {
        return report;
    }

    let mut best_cost = current_cost;
    let mut best: Vec<Module> = modules.to_vec();
    let mut temperature = config.initial_temperature;

    'cooling: while temperature > config.final_temperature {
        let mut accepted = 0;

        for _ in 0..config.moves_per_temperature {
            if report.steps >= config.max_steps {
                break 'cooling;
            }
            report.steps += 1;

            let saved_triple = triple.clone();
            let saved_positions: Vec<Point3> = modules.iter().map(Module::position).collect();

            let proposal = moves::propose(rng, triple, modules);
            report.rejected_rotations += proposal.rejected_rotations;
            let Some(mv) = proposal.applied else {
                continue;
            };
            triple.recalculate(modules, origin);

            let keep = if allocation::is_feasible(modules) {
                let new_cost = cost_fn.total_cost(modules, pairs);
                if metropolis_accept(new_cost - current_cost, temperature, rng) {
                    current_cost = new_cost;
                    true
                } else {
                    false
                }
            } else {
                report.rejected_infeasible += 1;
                false
            };

            if keep {
                accepted += 1;
                if current_cost < best_cost {
                    best_cost = current_cost;
                    best = modules.to_vec();
                }
            } else {
                rollback(modules, triple, saved_triple, &saved_positions, mv);
            }
        }

        report.accepted += accepted;
        trace!(temperature, accepted, cost = current_cost, "cooling step");
        temperature *= config.cooling_rate;
    }

    report.converged = temperature <= config.final_temperature;
    modules.clone_from_slice(&best);
    report.final_cost = best_cost;
    debug!(
        steps = report.steps,
        accepted = report.accepted,
        infeasible = report.rejected_infeasible,
        initial = report.initial_cost,
        best = best_cost,
        "annealing finished"
    );
    report
}

fn rollback(
    modules: &mut [Module],
    triple: &mut SequenceTriple,
    saved_triple: SequenceTriple,
    saved_positions: &[Point3],
    mv: Move,
) {
    *triple = saved_triple;
    moves::undo_rotation(modules, mv);
    for (module, &pos) in modules.iter_mut().zip(saved_positions) {
        module.set_position(pos);
    }
}
