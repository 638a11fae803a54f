//! A* search over the routing grid.
//!
//! Finds the lowest-cost path of unit steps between two cells. The caller
//! supplies the cost of entering a cell along an axis, which is how the
//! negotiated router folds congestion into the search.

use super::grid::RoutingGrid;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use tqec_common::{Axis, Point3};

/// A search state in the A* priority queue.
#[derive(Debug, Clone)]
struct AStarState {
    /// The cell currently being explored.
    cell: Point3,
    /// Total cost from start to this cell (g-score).
    cost: f64,
    /// Estimated total cost including heuristic (f-score = g + h).
    estimated_total: f64,
}

impl PartialEq for AStarState {
    fn eq(&self, other: &Self) -> bool {
        self.estimated_total == other.estimated_total && self.cell == other.cell
    }
}

impl Eq for AStarState {}

impl Ord for AStarState {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; ties go to the smaller cell.
        other
            .estimated_total
            .partial_cmp(&self.estimated_total)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for AStarState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Finds a path from `src` to `dst` using A* search.
///
/// `step_cost(cell, axis)` is the price of entering `cell` along `axis` and
/// must be at least 1. Returns every cell of the path including both ends,
/// or `None` if `dst` cannot be reached inside the grid.
pub(crate) fn astar_route(
    grid: &RoutingGrid,
    src: Point3,
    dst: Point3,
    step_cost: impl Fn(Point3, Axis) -> f64,
) -> Option<Vec<Point3>> {
    if src == dst {
        return Some(vec![src]);
    }

    let mut open = BinaryHeap::new();
    let mut g_scores: HashMap<Point3, f64> = HashMap::new();
    let mut came_from: HashMap<Point3, Point3> = HashMap::new();

    g_scores.insert(src, 0.0);
    open.push(AStarState {
        cell: src,
        cost: 0.0,
        estimated_total: heuristic(src, dst),
    });

    while let Some(current) = open.pop() {
        if current.cell == dst {
            return Some(reconstruct_path(&came_from, src, dst));
        }

        let current_g = *g_scores.get(&current.cell).unwrap_or(&f64::INFINITY);
        if current.cost > current_g {
            continue; // Stale entry
        }

        let parent = came_from.get(&current.cell).copied();
        for (next, axis) in grid.neighbors(current.cell, parent, dst) {
            let tentative_g = current_g + step_cost(next, axis);
            if tentative_g < *g_scores.get(&next).unwrap_or(&f64::INFINITY) {
                g_scores.insert(next, tentative_g);
                came_from.insert(next, current.cell);
                open.push(AStarState {
                    cell: next,
                    cost: tentative_g,
                    estimated_total: tentative_g + heuristic(next, dst),
                });
            }
        }
    }

    None
}

/// Shortest unit-cost path length in lattice units, or `None` if unreachable.
pub(crate) fn path_length(grid: &RoutingGrid, src: Point3, dst: Point3) -> Option<i64> {
    astar_route(grid, src, dst, |_, _| 1.0).map(|path| wire_length(&path))
}

/// Length of a path in lattice units.
pub(crate) fn wire_length(path: &[Point3]) -> i64 {
    path.windows(2).map(|w| w[0].manhattan(w[1])).sum()
}

/// Remaining unit steps, ignoring obstacles.
fn heuristic(from: Point3, to: Point3) -> f64 {
    (from.manhattan(to) / 2) as f64
}

/// Reconstructs the path from the came_from map.
fn reconstruct_path(came_from: &HashMap<Point3, Point3>, start: Point3, end: Point3) -> Vec<Point3> {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use tqec_common::{BoundingBox, Kind};

    fn p(x: i32, y: i32, z: i32) -> Point3 {
        Point3::new(x, y, z)
    }

    fn open_grid() -> RoutingGrid {
        RoutingGrid::new(Kind::Dual, BoundingBox::new(p(-9, -9, -9), p(9, 9, 9)))
    }

    #[test]
    fn straight_line() {
        let grid = open_grid();
        let path = astar_route(&grid, p(1, 1, 1), p(7, 1, 1), |_, _| 1.0).unwrap();
        assert_eq!(path, vec![p(1, 1, 1), p(3, 1, 1), p(5, 1, 1), p(7, 1, 1)]);
        assert_eq!(path_length(&grid, p(1, 1, 1), p(7, 1, 1)), Some(6));
    }

    #[test]
    fn detours_around_a_keep_out() {
        let mut grid = open_grid();
        grid.keep_out(BoundingBox::new(p(2, -1, -1), p(6, 3, 3)));
        let path = astar_route(&grid, p(1, 1, 1), p(7, 1, 1), |_, _| 1.0).unwrap();
        assert_eq!(path.first(), Some(&p(1, 1, 1)));
        assert_eq!(path.last(), Some(&p(7, 1, 1)));
        assert!(path.len() > 4);
        for w in path.windows(2) {
            assert_eq!(w[0].manhattan(w[1]), 2);
        }
    }

    #[test]
    fn enclosed_destination_is_unreachable() {
        let mut grid = open_grid();
        let dst = p(5, 5, 5);
        for axis in Axis::ALL {
            for d in [1, -1] {
                grid.wall(dst.offset(axis, d));
            }
        }
        assert!(astar_route(&grid, p(1, 1, 1), dst, |_, _| 1.0).is_none());
        assert_eq!(path_length(&grid, p(1, 1, 1), dst), None);
    }

    #[test]
    fn costly_cells_are_avoided() {
        let grid = open_grid();
        let hot = p(3, 1, 1);
        let path = astar_route(&grid, p(1, 1, 1), p(5, 1, 1), |c, _| if c == hot { 50.0 } else { 1.0 })
            .unwrap();
        assert!(!path.contains(&hot));
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn heuristic_counts_steps() {
        assert_eq!(heuristic(p(1, 1, 1), p(1, 1, 1)), 0.0);
        assert_eq!(heuristic(p(1, 1, 1), p(5, 3, 1)), 3.0);
    }
}
