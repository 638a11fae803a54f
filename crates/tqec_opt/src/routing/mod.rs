//! Net routing for one optimization phase.
//!
//! Groups the allocator's chains by net, closes each net into a loop by
//! pairing its free chain ends (nearest-neighbor tour plus 2-opt), and wires
//! every pair through the grid with negotiated congestion routing. The
//! resulting paths are materialized as edges of the net.

mod astar;
mod congestion;
mod grid;
mod negotiate;
mod tsp;

pub use congestion::{CongestionMap, Penalties};
pub use grid::RoutingGrid;
pub use tsp::{pair_ports, DistanceTable, Tour};

use crate::allocation::Allocation;
use crate::codes;
use crate::error::OptError;
use crate::module::Module;
use crate::placement::union_box;
use serde::Serialize;
use std::collections::BTreeMap;
use tqec_common::{Kind, Point3};
use tqec_config::RouteConfig;
use tqec_diagnostics::{Diagnostic, DiagnosticSink};
use tqec_lattice::{Category, Graph, LatticeError, LoopId};
use tracing::debug;

/// A point-to-point wire to be routed for a net.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RouteRequest {
    /// The net being wired.
    pub net: LoopId,
    /// Source port.
    pub from: Point3,
    /// Destination port.
    pub to: Point3,
}

/// A routed wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Route {
    /// The net the wire belongs to.
    pub net: LoopId,
    /// Every cell of the wire, both ports included.
    pub path: Vec<Point3>,
}

/// Statistics of one routing run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RoutingReport {
    /// Point-to-point requests after pairing.
    pub requests: usize,
    /// Rip-up rounds performed.
    pub iterations: usize,
    /// `false` if some cell is still shared by two wires.
    pub converged: bool,
    /// Total wire length in lattice units.
    pub wire_length: i64,
    /// The wires, in request order.
    pub routes: Vec<Route>,
}

/// Pairs the ports of every net into routing requests.
///
/// Ports are the free ends of the chains assigned to a net; the two ends of
/// one chain stay paired with each other in the tour.
pub fn plan_requests(grid: &RoutingGrid, allocation: &Allocation) -> Vec<RouteRequest> {
    let mut nets: BTreeMap<LoopId, (Vec<Point3>, Vec<(usize, usize)>)> = BTreeMap::new();
    for chain in &allocation.chains {
        if chain.endpoints.is_empty() {
            continue;
        }
        let (ports, fixed) = nets.entry(chain.id).or_default();
        for pair in chain.endpoints.chunks(2) {
            if let [a, b] = pair {
                fixed.push((ports.len(), ports.len() + 1));
                ports.push(*a);
                ports.push(*b);
            }
        }
    }

    let mut requests = Vec::new();
    for (net, (ports, fixed)) in nets {
        for (a, b) in pair_ports(grid, &ports, &fixed) {
            requests.push(RouteRequest {
                net,
                from: ports[a],
                to: ports[b],
            });
        }
    }
    requests
}

/// Shortest path by length alone, ignoring congestion.
pub fn shortest_path(grid: &RoutingGrid, from: Point3, to: Point3) -> Option<Vec<Point3>> {
    astar::astar_route(grid, from, to, |_, _| 1.0)
}

/// Adds the cells of `path` to `graph` as a wire of `net`.
///
/// A two-cell path becomes a single direct edge.
pub fn materialize(
    graph: &mut Graph,
    kind: Kind,
    net: LoopId,
    path: &[Point3],
) -> Result<(), LatticeError> {
    for w in path.windows(2) {
        graph.connect(w[0], w[1], kind, Category::Edge, Some(net))?;
    }
    Ok(())
}

/// Routes the nets threading `modules` and adds the wires to `graph`.
///
/// `graph` must already hold the modules' frames and cross edges. The
/// routing volume covers the modules and the graph, padded by the
/// configured margin; module interiors are kept out.
pub fn route_nets(
    graph: &mut Graph,
    modules: &[Module],
    allocation: &Allocation,
    config: &RouteConfig,
    sink: &DiagnosticSink,
) -> Result<RoutingReport, OptError> {
    let Some(kind) = modules.first().map(|m| m.kind().opposite()) else {
        return Ok(RoutingReport {
            converged: true,
            ..RoutingReport::default()
        });
    };
    let keep_out = modules.iter().map(Module::inner).collect();
    let grid = RoutingGrid::from_graph(graph, kind, union_box(modules), keep_out, config.margin);

    let requests = plan_requests(&grid, allocation);
    let negotiated = match negotiate::negotiate(&grid, &requests, config) {
        Ok(n) => n,
        Err(i) => {
            let req = requests[i];
            sink.emit(
                Diagnostic::error(
                    codes::no_route(),
                    format!("no route for net {} from {} to {}", req.net, req.from, req.to),
                )
                .at(req.from)
                .with_help(format!("increase `route.margin` (currently {})", config.margin)),
            );
            return Err(OptError::NoRoute {
                net: req.net,
                from: req.from,
                to: req.to,
            });
        }
    };

    if !negotiated.converged {
        sink.emit(
            Diagnostic::warning(
                codes::routing_not_converged(),
                format!(
                    "rip-and-reroute stopped after {} iterations with shared cells",
                    negotiated.iterations
                ),
            )
            .with_help("raise `route.max_iterations` or `route.penalty_growth`"),
        );
    }

    let mut report = RoutingReport {
        requests: requests.len(),
        iterations: negotiated.iterations,
        converged: negotiated.converged,
        ..RoutingReport::default()
    };
    for (req, path) in requests.iter().zip(negotiated.paths) {
        materialize(graph, kind, req.net, &path)?;
        report.wire_length += astar::wire_length(&path);
        report.routes.push(Route { net: req.net, path });
    }
    debug!(
        requests = report.requests,
        iterations = report.iterations,
        wire_length = report.wire_length,
        "routing finished"
    );
    Ok(report)
}
