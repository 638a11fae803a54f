//! Module placement.
//!
//! Encodes the module arrangement as a sequence triple, packs it once to get
//! a compact starting layout, and refines that layout with simulated
//! annealing. The connector allocator acts as a feasibility filter for every
//! candidate layout.

mod anneal;
mod cost;
mod moves;
mod sequence_triple;

pub use anneal::metropolis_accept;
pub use cost::{shared_net_pairs, union_box, PlacementCost};
pub use moves::{Move, Proposal};
pub use sequence_triple::{SequencePair, SequenceTriple};

use crate::allocation;
use crate::codes;
use crate::error::OptError;
use crate::module::Module;
use rand::Rng;
use serde::Serialize;
use tqec_common::Kind;
use tqec_config::AnnealConfig;
use tqec_diagnostics::{Diagnostic, DiagnosticSink};

/// Statistics of one placement run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PlacementReport {
    /// Cost of the compacted initial layout.
    pub initial_cost: f64,
    /// Cost of the returned layout.
    pub final_cost: f64,
    /// Proposals drawn.
    pub steps: usize,
    /// Proposals kept.
    pub accepted: usize,
    /// Proposals rolled back because allocation failed.
    pub rejected_infeasible: usize,
    /// Rotation draws rejected for breaking lattice parity.
    pub rejected_rotations: usize,
    /// `false` if the step cap was hit before the final temperature.
    pub converged: bool,
}

/// Places the modules of one phase.
///
/// The modules are first packed against the corner of their current union
/// box, which keeps every coordinate on its sublattice. That compacted layout
/// must be feasible; otherwise the input lattice itself is inconsistent and
/// [`OptError::InfeasibleInitialPlacement`] is returned.
pub fn place(
    modules: &mut [Module],
    kind: Kind,
    config: &AnnealConfig,
    rng: &mut impl Rng,
    sink: &DiagnosticSink,
) -> Result<PlacementReport, OptError> {
    let Some(start) = union_box(modules) else {
        return Ok(PlacementReport {
            converged: true,
            ..PlacementReport::default()
        });
    };
    let origin = start.min;

    let mut triple = SequenceTriple::from_modules(modules);
    triple.recalculate(modules, origin);
    if !allocation::is_feasible(modules) {
        sink.emit(
            Diagnostic::error(
                codes::infeasible_placement(),
                format!("initial {kind} placement admits no consistent port ids"),
            )
            .at(origin)
            .with_help("every port chain must share an id available in all of its modules"),
        );
        return Err(OptError::InfeasibleInitialPlacement { kind });
    }

    let pairs = shared_net_pairs(modules);
    let report = anneal::simulated_annealing(modules, &mut triple, origin, &pairs, config, rng);

    if !report.converged {
        sink.emit(
            Diagnostic::warning(
                codes::placement_not_cooled(),
                format!(
                    "{kind} placement stopped after {} steps before reaching the final temperature",
                    report.steps
                ),
            )
            .with_help("raise `anneal.max_steps` or lower `anneal.moves_per_temperature`"),
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::tests::square_module;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> AnnealConfig {
        AnnealConfig {
            initial_temperature: 10.0,
            final_temperature: 0.1,
            cooling_rate: 0.8,
            moves_per_temperature: 20,
            ..AnnealConfig::default()
        }
    }

    #[test]
    fn place_packs_three_boxes() {
        let mut modules = vec![
            square_module(1, 0, 0, None),
            square_module(2, 10, 0, None),
            square_module(3, 20, 0, None),
        ];
        let config = config();
        let sink = DiagnosticSink::new();
        let mut rng = StdRng::seed_from_u64(5);
        let report = place(&mut modules, Kind::Primal, &config, &mut rng, &sink).unwrap();

        let bbox = union_box(&modules).unwrap();
        assert_eq!(bbox.volume(), 96);
        assert_eq!(report.final_cost, 128.0);
        assert!(!sink.has_errors());
    }

    #[test]
    fn infeasible_start_is_fatal() {
        // Two ports of different nets collapse onto one joint after compaction.
        let mut modules = vec![square_module(1, 0, 0, Some(5)), square_module(2, 10, 0, Some(6))];
        let config = config();
        let sink = DiagnosticSink::new();
        let mut rng = StdRng::seed_from_u64(5);
        let err = place(&mut modules, Kind::Primal, &config, &mut rng, &sink).unwrap_err();
        assert!(matches!(
            err,
            OptError::InfeasibleInitialPlacement { kind: Kind::Primal }
        ));
        assert!(sink.has_errors());
    }

    #[test]
    fn empty_phase_is_trivially_placed() {
        let config = config();
        let sink = DiagnosticSink::new();
        let mut rng = StdRng::seed_from_u64(5);
        let report = place(&mut [], Kind::Dual, &config, &mut rng, &sink).unwrap();
        assert!(report.converged);
        assert_eq!(report.steps, 0);
    }
}
