//! Lattice optimizer for topological quantum error correction circuits.
//!
//! This crate takes a defect lattice [`Graph`] (closed loops with crossing
//! references, as produced by a circuit-to-lattice constructor) and shrinks
//! its space-time volume while keeping its topology.
//!
//! # Pipeline
//!
//! 1. **Reduce**: prune open segments, then merge loops with the
//!    injector pass-through and bridge elimination rules
//! 2. **Build modules**: one rigid unit per loop of the phase's kind
//! 3. **Place**: sequence-triple packing refined by simulated annealing
//! 4. **Allocate**: give every cross port a consistent net id
//! 5. **Route**: pair each net's ports and wire them with negotiated
//!    congestion routing
//!
//! Steps 2 to 5 run once per configured phase (primal, then dual by default),
//! each phase rebuilding the graph from its modules and wires.
//!
//! # Usage
//!
//! ```ignore
//! use tqec_opt::optimize;
//!
//! let report = optimize(&mut graph, &config, &sink)?;
//! assert!(report.volume_after <= report.volume_before);
//! ```

#![warn(missing_docs)]

pub mod allocation;
pub mod error;
pub mod module;
pub mod placement;
pub mod project;
pub mod reduce;
pub mod routing;

pub use allocation::{allocate, Allocation, Chain, PortRef};
pub use error::OptError;
pub use module::{build_modules, rebuild_graph, Module, ModuleSet};
pub use placement::{place, PlacementCost, PlacementReport, SequenceTriple};
pub use project::{optimize_project, render_run};
pub use reduce::{reduce, ReduceReport, Rewrite};
pub use routing::{route_nets, RouteRequest, RoutingReport};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tqec_common::{InternalError, Kind};
use tqec_config::{validate_config, OptimizerConfig};
use tqec_diagnostics::{Diagnostic, DiagnosticSink};
use tqec_lattice::{Graph, LoopId};
use tracing::{debug, info, instrument};

/// Diagnostic codes emitted by the optimizer.
pub(crate) mod codes {
    use tqec_diagnostics::{Category, DiagnosticCode, Stage};

    /// `W301`: annealing hit the step cap before cooling down.
    pub fn placement_not_cooled() -> DiagnosticCode {
        DiagnosticCode::new(Category::Warning, Stage::Place, 301)
    }

    /// `W302`: rip-and-reroute stopped with shared cells.
    pub fn routing_not_converged() -> DiagnosticCode {
        DiagnosticCode::new(Category::Warning, Stage::Route, 302)
    }

    /// `E303`: no path for a net.
    pub fn no_route() -> DiagnosticCode {
        DiagnosticCode::new(Category::Error, Stage::Route, 303)
    }

    /// `E304`: the compacted input placement cannot be allocated.
    pub fn infeasible_placement() -> DiagnosticCode {
        DiagnosticCode::new(Category::Error, Stage::Place, 304)
    }

    /// `N305`: reducer summary.
    pub fn reduce_summary() -> DiagnosticCode {
        DiagnosticCode::new(Category::Note, Stage::Reduce, 305)
    }

    /// `W306`: a net threads no module and is dropped by the phase.
    pub fn orphan_net() -> DiagnosticCode {
        DiagnosticCode::new(Category::Warning, Stage::Phase, 306)
    }

    /// `W307`: an injector found outside every module could not be re-attached.
    pub fn injector_dropped() -> DiagnosticCode {
        DiagnosticCode::new(Category::Warning, Stage::Phase, 307)
    }
}

/// Results of one placement-and-routing phase.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhaseReport {
    /// The sublattice whose loops were placed.
    pub kind: Kind,
    /// Number of modules placed.
    pub modules: usize,
    /// Placer statistics.
    pub placement: PlacementReport,
    /// Router statistics.
    pub routing: RoutingReport,
}

/// Results of a full optimization run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptimizeReport {
    /// [`Graph::lattice_volume`] of the input.
    pub volume_before: i64,
    /// [`Graph::lattice_volume`] of the output.
    pub volume_after: i64,
    /// Reducer statistics.
    pub reduction: ReduceReport,
    /// One entry per phase that had modules to place.
    pub phases: Vec<PhaseReport>,
}

/// Runs the whole optimization on `graph` in place.
///
/// The configuration is validated first. All randomness comes from one
/// generator seeded with `config.seed`, so equal inputs give equal outputs.
/// On error `graph` may hold a partially optimized lattice.
#[instrument(skip_all, fields(seed = config.seed))]
pub fn optimize(
    graph: &mut Graph,
    config: &OptimizerConfig,
    sink: &DiagnosticSink,
) -> Result<OptimizeReport, OptError> {
    validate_config(config)?;
    let volume_before = graph.lattice_volume();

    let reduction = reduce::reduce(graph, &config.route, sink)?;
    info!(
        loops_before = reduction.loops_before,
        loops_after = reduction.loops_after,
        "reduction finished"
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut phases = Vec::with_capacity(config.phases.len());
    for &kind in &config.phases {
        if let Some(phase) = run_phase(graph, kind, config, &mut rng, sink)? {
            phases.push(phase);
        }
    }

    let volume_after = graph.lattice_volume();
    info!(volume_before, volume_after, "optimization finished");
    Ok(OptimizeReport {
        volume_before,
        volume_after,
        reduction,
        phases,
    })
}

/// Places and routes the loops of `kind`, replacing `graph` with the result.
///
/// Returns `None` when the graph has no loop of that kind.
fn run_phase(
    graph: &mut Graph,
    kind: Kind,
    config: &OptimizerConfig,
    rng: &mut StdRng,
    sink: &DiagnosticSink,
) -> Result<Option<PhaseReport>, OptError> {
    let ModuleSet {
        mut modules,
        orphan_nets,
        outside_injectors,
    } = build_modules(graph, kind);

    if modules.is_empty() {
        debug!(%kind, "no modules, phase skipped");
        return Ok(None);
    }
    for net in &orphan_nets {
        sink.emit(Diagnostic::warning(
            codes::orphan_net(),
            format!("net {net} threads no {kind} module and is dropped"),
        ));
    }

    let placement = place(&mut modules, kind, &config.anneal, rng, sink)?;
    let allocation = allocate(&modules).ok_or_else(|| {
        InternalError::new(format!("annealed {kind} placement lost its allocation"))
    })?;
    allocation.apply(&mut modules);

    let mut next = rebuild_graph(&modules, graph.loop_count())?;
    let routing = route_nets(&mut next, &modules, &allocation, &config.route, sink)?;

    for (&net, categories) in &outside_injectors {
        for &category in categories {
            reattach_injector(&mut next, net, category, sink)?;
        }
    }

    debug!(
        %kind,
        modules = modules.len(),
        cost = placement.final_cost,
        wire_length = routing.wire_length,
        "phase finished"
    );
    *graph = next;
    Ok(Some(PhaseReport {
        kind,
        modules: modules.len(),
        placement,
        routing,
    }))
}

fn reattach_injector(
    graph: &mut Graph,
    net: LoopId,
    category: tqec_lattice::Category,
    sink: &DiagnosticSink,
) -> Result<(), OptError> {
    let edges = graph.edges_with_id(net);
    let Some(site) = reduce::injector_site(graph, &edges) else {
        sink.emit(Diagnostic::warning(
            codes::injector_dropped(),
            format!("net {net} has no free edge for its {category:?} injector"),
        ));
        return Ok(());
    };
    graph.set_category(site, category)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tqec_common::Point3;
    use tqec_lattice::Category;

    fn p(x: i32, y: i32, z: i32) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn empty_graph_is_a_no_op() {
        let mut graph = Graph::new();
        let sink = DiagnosticSink::new();
        let report = optimize(&mut graph, &OptimizerConfig::default(), &sink).unwrap();
        assert_eq!(report.volume_before, 0);
        assert_eq!(report.volume_after, 0);
        assert!(report.phases.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut graph = Graph::new();
        let mut config = OptimizerConfig::default();
        config.route.margin = 3;
        let sink = DiagnosticSink::new();
        let err = optimize(&mut graph, &config, &sink).unwrap_err();
        assert!(matches!(err, OptError::Config(_)));
    }

    #[test]
    fn codes_display() {
        assert_eq!(codes::placement_not_cooled().to_string(), "W301");
        assert_eq!(codes::no_route().to_string(), "E303");
        assert_eq!(codes::reduce_summary().to_string(), "N305");
        assert_eq!(codes::orphan_net().stage, tqec_diagnostics::Stage::Phase);
    }

    #[test]
    fn lone_primal_loop_survives_both_phases() {
        let mut graph = Graph::new();
        let id = Some(LoopId::from_raw(1));
        let corners = [p(0, 0, 0), p(0, 2, 0), p(0, 2, 2), p(0, 0, 2)];
        for i in 0..4 {
            graph
                .connect(corners[i], corners[(i + 1) % 4], Kind::Primal, Category::Edge, id)
                .unwrap();
        }
        let sink = DiagnosticSink::new();
        let report = optimize(&mut graph, &OptimizerConfig::default(), &sink).unwrap();
        assert_eq!(report.phases.len(), 1);
        assert_eq!(report.phases[0].kind, Kind::Primal);
        assert_eq!(graph.edges_with_id(LoopId::from_raw(1)).len(), 4);
        assert_eq!(report.volume_after, report.volume_before);
        assert!(!sink.has_errors());
    }
}
