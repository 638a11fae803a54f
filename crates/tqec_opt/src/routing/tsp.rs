//! Pairing of net ports into point-to-point requests.
//!
//! A net whose ports come from several chains is closed into one loop by a
//! tour through all its ports. Each chain's two ends are already joined
//! inside the modules, so the tour must keep them adjacent; the remaining
//! tour edges are the wires to route.

use super::astar;
use super::grid::RoutingGrid;
use tqec_common::Point3;

/// Distance used for port pairs with no path between them.
pub(crate) const UNREACHABLE: i64 = i64::MAX / 4;

/// Upper bound on 2-opt improvement rounds.
const MAX_TWO_OPT_ROUNDS: usize = 1000;

/// Grid path lengths between every pair of ports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistanceTable {
    n: usize,
    dist: Vec<i64>,
}

impl DistanceTable {
    /// Measures every pair on the static grid.
    pub fn measure(grid: &RoutingGrid, ports: &[Point3]) -> Self {
        let n = ports.len();
        let mut dist = vec![0; n * n];
        for i in 0..n {
            for j in i + 1..n {
                let d = astar::path_length(grid, ports[i], ports[j]).unwrap_or(UNREACHABLE);
                dist[i * n + j] = d;
                dist[j * n + i] = d;
            }
        }
        Self { n, dist }
    }

    /// Builds a table from precomputed rows.
    pub fn from_rows(rows: &[Vec<i64>]) -> Self {
        let n = rows.len();
        Self {
            n,
            dist: rows.iter().flatten().copied().collect(),
        }
    }

    /// Distance between ports `a` and `b`.
    pub fn get(&self, a: usize, b: usize) -> i64 {
        self.dist[a * self.n + b]
    }
}

/// A closed tour over port indices where `partner[i]` must stay next to `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tour {
    order: Vec<usize>,
    partner: Vec<Option<usize>>,
}

impl Tour {
    /// Nearest-neighbor construction from port 0.
    ///
    /// After each port the tour visits its fixed partner if unvisited, else
    /// the nearest unvisited port, ties going to the lowest index.
    pub fn nearest_neighbor(table: &DistanceTable, partner: Vec<Option<usize>>) -> Self {
        let n = partner.len();
        let mut order = Vec::with_capacity(n);
        let mut visited = vec![false; n];
        if n == 0 {
            return Self { order, partner };
        }
        let mut current = 0;
        loop {
            visited[current] = true;
            order.push(current);
            let next = match partner[current] {
                Some(q) if !visited[q] => Some(q),
                _ => (0..n)
                    .filter(|&j| !visited[j])
                    .min_by_key(|&j| (table.get(current, j), j)),
            };
            match next {
                Some(j) => current = j,
                None => break,
            }
        }
        Self { order, partner }
    }

    /// Port indices in tour order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    fn is_fixed(&self, a: usize, b: usize) -> bool {
        self.partner[a] == Some(b)
    }

    /// Total tour length, including the closing edge.
    pub fn length(&self, table: &DistanceTable) -> i64 {
        self.edges().map(|(a, b)| table.get(a, b)).sum()
    }

    fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.order.len();
        (0..n).map(move |i| (self.order[i], self.order[(i + 1) % n]))
    }

    /// 2-opt local search that never breaks a fixed edge.
    ///
    /// Reversing a segment keeps every edge inside it intact, so only the two
    /// removed edges need to be free.
    pub fn two_opt(&mut self, table: &DistanceTable) {
        let n = self.order.len();
        if n < 4 {
            return;
        }
        for _ in 0..MAX_TWO_OPT_ROUNDS {
            let mut improved = false;
            for i in 0..n - 1 {
                for j in i + 2..n {
                    let (a, b) = (self.order[i], self.order[i + 1]);
                    let (c, d) = (self.order[j], self.order[(j + 1) % n]);
                    if a == d || self.is_fixed(a, b) || self.is_fixed(c, d) {
                        continue;
                    }
                    let before = table.get(a, b).saturating_add(table.get(c, d));
                    let after = table.get(a, c).saturating_add(table.get(b, d));
                    if after < before {
                        self.order[i + 1..=j].reverse();
                        improved = true;
                    }
                }
            }
            if !improved {
                break;
            }
        }
    }

    /// Consecutive tour pairs that are not fixed, as index pairs.
    ///
    /// A two-port tour yields its single pair once.
    pub fn free_pairs(&self) -> Vec<(usize, usize)> {
        match self.order.as_slice() {
            [] | [_] => Vec::new(),
            [a, b] => vec![(*a, *b)],
            _ => self.edges().filter(|&(a, b)| !self.is_fixed(a, b)).collect(),
        }
    }
}

/// Pairs up ports; `fixed` lists port index pairs already joined.
pub fn pair_ports(grid: &RoutingGrid, ports: &[Point3], fixed: &[(usize, usize)]) -> Vec<(usize, usize)> {
    if ports.len() == 2 {
        return vec![(0, 1)];
    }
    let mut partner = vec![None; ports.len()];
    for &(a, b) in fixed {
        partner[a] = Some(b);
        partner[b] = Some(a);
    }
    let table = DistanceTable::measure(grid, ports);
    let mut tour = Tour::nearest_neighbor(&table, partner);
    tour.two_opt(&table);
    tour.free_pairs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tqec_common::{BoundingBox, Kind};

    fn p(x: i32, y: i32, z: i32) -> Point3 {
        Point3::new(x, y, z)
    }

    /// Four ports on a line at 0, 10, 2, 12 (index order).
    fn line_table() -> DistanceTable {
        let xs = [0i64, 10, 2, 12];
        let rows: Vec<Vec<i64>> = xs
            .iter()
            .map(|a| xs.iter().map(|b| (a - b).abs()).collect())
            .collect();
        DistanceTable::from_rows(&rows)
    }

    #[test]
    fn nearest_neighbor_follows_partners() {
        let table = line_table();
        let tour = Tour::nearest_neighbor(&table, vec![Some(1), Some(0), Some(3), Some(2)]);
        assert_eq!(tour.order(), &[0, 1, 3, 2]);
        assert_eq!(tour.free_pairs(), vec![(1, 3), (2, 0)]);
    }

    #[test]
    fn nearest_neighbor_without_partners() {
        let table = line_table();
        let tour = Tour::nearest_neighbor(&table, vec![None; 4]);
        assert_eq!(tour.order(), &[0, 2, 1, 3]);
    }

    #[test]
    fn two_opt_untangles_without_breaking_fixed_edges() {
        // Ports 0..6 on a line; 0-5 and 1-4 are fixed chains.
        let xs = [0i64, 2, 40, 42, 20, 22];
        let rows: Vec<Vec<i64>> = xs
            .iter()
            .map(|a| xs.iter().map(|b| (a - b).abs()).collect())
            .collect();
        let table = DistanceTable::from_rows(&rows);
        let partner = vec![Some(5), Some(4), None, None, Some(1), Some(0)];
        let mut tour = Tour::nearest_neighbor(&table, partner);
        let before = tour.length(&table);
        tour.two_opt(&table);
        assert!(tour.length(&table) <= before);

        let order = tour.order().to_vec();
        let n = order.len();
        let adjacent = |a: usize, b: usize| {
            (0..n).any(|i| {
                let (x, y) = (order[i], order[(i + 1) % n]);
                (x, y) == (a, b) || (x, y) == (b, a)
            })
        };
        assert!(adjacent(0, 5));
        assert!(adjacent(1, 4));
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn two_ports_make_one_request() {
        let grid = RoutingGrid::new(Kind::Dual, BoundingBox::new(p(-9, -9, -9), p(9, 9, 9)));
        let pairs = pair_ports(&grid, &[p(1, 1, 1), p(5, 1, 1)], &[(0, 1)]);
        assert_eq!(pairs, vec![(0, 1)]);
    }

    #[test]
    fn four_ports_of_two_chains_make_two_requests() {
        let grid = RoutingGrid::new(Kind::Dual, BoundingBox::new(p(-9, -9, -9), p(9, 9, 9)));
        let ports = [p(-1, 1, 1), p(1, 1, 1), p(-1, 1, 7), p(1, 1, 7)];
        let pairs = pair_ports(&grid, &ports, &[(0, 1), (2, 3)]);
        assert_eq!(pairs.len(), 2);
        let mut touched: Vec<usize> = pairs.iter().flat_map(|&(a, b)| [a, b]).collect();
        touched.sort();
        assert_eq!(touched, vec![0, 1, 2, 3]);
        for (a, b) in pairs {
            assert_eq!(ports[a].x, ports[b].x);
        }
    }
}
