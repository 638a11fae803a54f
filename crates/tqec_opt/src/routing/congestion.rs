//! Congestion tracking for rip-and-reroute.
//!
//! Tracks how many wires pass through each grid cell, and along which axes,
//! and maintains history costs that grow each iteration for overused cells.
//! The axis bookkeeping is what lets the router charge more for running
//! alongside another wire in a cell than for crossing it.

use std::collections::HashMap;
use tqec_common::{Axis, Point3};

/// Penalty weights for entering a congested cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penalties {
    /// Charged when another wire already runs along the same axis in the cell.
    pub parallel: f64,
    /// Charged when another wire touches the cell along a different axis.
    pub cross: f64,
    /// Multiplier applied to both, growing with the iteration count.
    pub rate: f64,
}

/// Tracks per-cell congestion state across rip-and-reroute iterations.
///
/// Each cell has a present demand (wires currently through it), a capacity
/// of one, and a history cost accumulated for repeated overuse.
#[derive(Debug, Clone)]
pub struct CongestionMap {
    /// Present demand: number of wires currently through each cell.
    demand: HashMap<Point3, u32>,
    /// Present demand per cell and travel axis.
    axis_demand: HashMap<(Point3, Axis), u32>,
    /// History cost: accumulated penalty for each cell across iterations.
    history: HashMap<Point3, f64>,
    /// Capacity of each cell.
    capacity: u32,
    /// History cost increment per iteration.
    history_factor: f64,
}

/// Interior cells of a path with the axes a wire travels through them.
fn interior(path: &[Point3]) -> impl Iterator<Item = (Point3, Vec<Axis>)> + '_ {
    path.windows(3).map(|w| {
        let mut axes = Vec::with_capacity(2);
        for axis in [w[0].axis_to(w[1]), w[1].axis_to(w[2])].into_iter().flatten() {
            if !axes.contains(&axis) {
                axes.push(axis);
            }
        }
        (w[1], axes)
    })
}

impl CongestionMap {
    /// Creates a new congestion map with default parameters.
    pub fn new() -> Self {
        Self {
            demand: HashMap::new(),
            axis_demand: HashMap::new(),
            history: HashMap::new(),
            capacity: 1,
            history_factor: 1.0,
        }
    }

    /// Records the interior cells of a wire. Endpoints are ports, not shared cells.
    pub fn add_path(&mut self, path: &[Point3]) {
        for (cell, axes) in interior(path) {
            *self.demand.entry(cell).or_insert(0) += 1;
            for axis in axes {
                *self.axis_demand.entry((cell, axis)).or_insert(0) += 1;
            }
        }
    }

    /// Removes a wire recorded with [`add_path`](Self::add_path).
    pub fn remove_path(&mut self, path: &[Point3]) {
        for (cell, axes) in interior(path) {
            if let Some(d) = self.demand.get_mut(&cell) {
                *d = d.saturating_sub(1);
            }
            for axis in axes {
                if let Some(d) = self.axis_demand.get_mut(&(cell, axis)) {
                    *d = d.saturating_sub(1);
                }
            }
        }
    }

    /// Returns whether any cell is overused (demand > capacity).
    pub fn has_congestion(&self) -> bool {
        self.demand.values().any(|&d| d > self.capacity)
    }

    /// Returns the number of overused cells.
    pub fn overused_count(&self) -> usize {
        self.demand.values().filter(|&&d| d > self.capacity).count()
    }

    /// Returns `true` if any interior cell of `path` is overused.
    pub fn is_congested(&self, path: &[Point3]) -> bool {
        interior(path).any(|(cell, _)| self.demand.get(&cell).is_some_and(|&d| d > self.capacity))
    }

    /// Returns the cost of entering `cell` along `axis`.
    ///
    /// One unit of length, plus the parallel penalty if another wire already
    /// runs along `axis` here or else the cross penalty if the cell is used
    /// at all, plus the cell's history cost.
    pub fn step_cost(&self, cell: Point3, axis: Axis, penalties: &Penalties) -> f64 {
        let present = if self.axis_demand.get(&(cell, axis)).is_some_and(|&d| d > 0) {
            penalties.parallel * penalties.rate
        } else if self.demand.get(&cell).is_some_and(|&d| d > 0) {
            penalties.cross * penalties.rate
        } else {
            0.0
        };
        let history = *self.history.get(&cell).unwrap_or(&0.0);
        1.0 + present + history
    }

    /// Updates history costs at the end of an iteration.
    ///
    /// Increases the history cost for every overused cell, making it more
    /// expensive in future iterations and encouraging rerouting.
    pub fn update_history(&mut self) {
        for (&cell, &demand) in &self.demand {
            if demand > self.capacity {
                let overflow = (demand - self.capacity) as f64;
                *self.history.entry(cell).or_insert(0.0) += overflow * self.history_factor;
            }
        }
    }
}

impl Default for CongestionMap {
    fn default() -> Self {
        Self::new()
    }
}
