//! Negotiated rip-and-reroute.
//!
//! Routes every request once by pure length, then iteratively rips up the
//! requests that pass through overused cells and reroutes them against the
//! growing congestion costs, until no cell is shared or the iteration cap is
//! reached.

use super::astar;
use super::congestion::{CongestionMap, Penalties};
use super::grid::RoutingGrid;
use super::RouteRequest;
use tqec_config::RouteConfig;
use tracing::trace;

/// The outcome of a negotiation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Negotiated {
    /// One path per request, in request order.
    pub paths: Vec<Vec<tqec_common::Point3>>,
    /// Rip-up rounds performed.
    pub iterations: usize,
    /// `true` if no cell is shared by two paths.
    pub converged: bool,
}

/// Routes all requests; `Err(i)` names the first request with no path.
pub(crate) fn negotiate(
    grid: &RoutingGrid,
    requests: &[RouteRequest],
    config: &RouteConfig,
) -> Result<Negotiated, usize> {
    let mut congestion = CongestionMap::new();
    let mut paths = Vec::with_capacity(requests.len());
    for (i, req) in requests.iter().enumerate() {
        let path = astar::astar_route(grid, req.from, req.to, |_, _| 1.0).ok_or(i)?;
        congestion.add_path(&path);
        paths.push(path);
    }

    let mut iterations = 0;
    while congestion.has_congestion() && iterations < config.max_iterations {
        iterations += 1;
        congestion.update_history();
        let penalties = Penalties {
            parallel: config.parallel_penalty,
            cross: config.cross_penalty,
            rate: config.penalty_growth.powi(iterations as i32),
        };

        for (i, req) in requests.iter().enumerate() {
            if !congestion.is_congested(&paths[i]) {
                continue;
            }
            congestion.remove_path(&paths[i]);
            let path = astar::astar_route(grid, req.from, req.to, |cell, axis| {
                congestion.step_cost(cell, axis, &penalties)
            })
            .ok_or(i)?;
            congestion.add_path(&path);
            paths[i] = path;
        }
        trace!(iterations, overused = congestion.overused_count(), "reroute pass");
    }

    Ok(Negotiated {
        paths,
        iterations,
        converged: !congestion.has_congestion(),
    })
}
