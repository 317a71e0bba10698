//! Objective evaluation: total edge length of a layout
//!
//! The full evaluation is O(E). [`Objective::swap_delta`] only touches the edges
//! incident to the two swapped entities, which keeps a local-search iteration at
//! O(deg(i) + deg(j)) regardless of graph size.

use serde::Serialize;

use crate::graph::Graph;

use super::lattice::Lattice;
use super::types::{Assignment, Point};

/// Summary of edge lengths
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeStats {
    pub edge_count: usize,
    pub total: f64,
    pub min: f64,
    pub max: f64,
}

impl EdgeStats {
    /// Accumulate over individual edge lengths
    pub fn from_lengths(lengths: impl IntoIterator<Item = f64>) -> Self {
        let mut stats = Self {
            edge_count: 0,
            total: 0.0,
            min: f64::INFINITY,
            max: 0.0,
        };
        for length in lengths {
            stats.edge_count += 1;
            stats.total += length;
            stats.min = stats.min.min(length);
            stats.max = stats.max.max(length);
        }
        if stats.edge_count == 0 {
            stats.min = 0.0;
        }
        stats
    }

    /// Edge lengths for free coordinates (one point per entity)
    pub fn from_points(graph: &Graph, points: &[Point]) -> Self {
        Self::from_lengths(
            graph
                .edges()
                .iter()
                .map(|e| points[e.a].distance(points[e.b])),
        )
    }

    /// Mean edge length, zero without edges
    pub fn average(&self) -> f64 {
        if self.edge_count == 0 {
            0.0
        } else {
            self.total / self.edge_count as f64
        }
    }
}

/// Total edge length of free coordinates
pub fn total_distance_of_points(graph: &Graph, points: &[Point]) -> f64 {
    graph
        .edges()
        .iter()
        .map(|e| points[e.a].distance(points[e.b]))
        .sum()
}

/// Evaluates assignments of a graph onto a lattice
#[derive(Debug, Clone, Copy)]
pub struct Objective<'a> {
    graph: &'a Graph,
    lattice: &'a Lattice,
}

impl<'a> Objective<'a> {
    pub fn new(graph: &'a Graph, lattice: &'a Lattice) -> Self {
        debug_assert_eq!(graph.len(), lattice.len());
        Self { graph, lattice }
    }

    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    #[inline]
    fn point_of(&self, assignment: &Assignment, entity: usize) -> Point {
        self.lattice.point(assignment.slot(entity))
    }

    /// Sum of edge lengths under an assignment
    pub fn total_distance(&self, assignment: &Assignment) -> f64 {
        self.graph
            .edges()
            .iter()
            .map(|e| {
                self.point_of(assignment, e.a)
                    .distance(self.point_of(assignment, e.b))
            })
            .sum()
    }

    /// Total, min and max edge length under an assignment
    pub fn edge_stats(&self, assignment: &Assignment) -> EdgeStats {
        EdgeStats::from_lengths(self.graph.edges().iter().map(|e| {
            self.point_of(assignment, e.a)
                .distance(self.point_of(assignment, e.b))
        }))
    }

    /// Change in total distance if entities `i` and `j` exchanged positions.
    ///
    /// Negative means the swap shortens the layout. The `i`–`j` edge, if present,
    /// keeps its length and is skipped.
    pub fn swap_delta(&self, assignment: &Assignment, i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }
        let p_i = self.point_of(assignment, i);
        let p_j = self.point_of(assignment, j);

        let mut delta = 0.0;
        for &k in self.graph.neighbors(i) {
            if k == j {
                continue;
            }
            let p_k = self.point_of(assignment, k);
            delta += p_j.distance(p_k) - p_i.distance(p_k);
        }
        for &k in self.graph.neighbors(j) {
            if k == i {
                continue;
            }
            let p_k = self.point_of(assignment, k);
            delta += p_i.distance(p_k) - p_j.distance(p_k);
        }
        delta
    }
}

// ============================================================================
// Offline diagnostics
// ============================================================================

/// Dense slot-to-slot distance matrix.
///
/// O(N²) memory; only for diagnostics and cross-checks, never inside the
/// optimisation loops.
pub struct DistanceMatrix {
    n: usize,
    distances: Vec<f64>,
}

impl DistanceMatrix {
    pub fn from_lattice(lattice: &Lattice) -> Self {
        let n = lattice.len();
        let mut distances = vec![0.0; n * n];
        for i in 0..n {
            for j in i + 1..n {
                let d = lattice.point(i).distance(lattice.point(j));
                distances[i * n + j] = d;
                distances[j * n + i] = d;
            }
        }
        Self { n, distances }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.distances[i * self.n + j]
    }

    /// Total distance of an assignment via table lookups
    pub fn total_distance(&self, graph: &Graph, assignment: &Assignment) -> f64 {
        graph
            .edges()
            .iter()
            .map(|e| self.get(assignment.slot(e.a), assignment.slot(e.b)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphInput;

    fn square_graph() -> Graph {
        GraphInput::from_pairs(1..=4, &[(1, 2), (2, 3), (3, 4), (4, 1), (1, 3)])
            .to_graph()
            .unwrap()
    }

    #[test]
    fn test_stats_match_total() {
        let graph = square_graph();
        let lattice = Lattice::generate(4, 80.0);
        let objective = Objective::new(&graph, &lattice);
        let assignment = Assignment::identity(4);

        let stats = objective.edge_stats(&assignment);
        assert_eq!(stats.edge_count, 5);
        assert!((stats.total - objective.total_distance(&assignment)).abs() < 1e-9);
        assert!(stats.min <= stats.average() && stats.average() <= stats.max);

        let points = assignment.points(&lattice);
        assert!((total_distance_of_points(&graph, &points) - stats.total).abs() < 1e-9);
        assert_eq!(EdgeStats::from_points(&graph, &points), stats);
    }

    #[test]
    fn test_empty_stats() {
        let stats = EdgeStats::from_lengths(std::iter::empty());
        assert_eq!(stats.edge_count, 0);
        assert_eq!(stats.average(), 0.0);
        assert_eq!(stats.min, 0.0);
    }

    #[test]
    fn test_swap_delta_matches_recompute() {
        let graph = square_graph();
        let lattice = Lattice::generate(4, 80.0);
        let objective = Objective::new(&graph, &lattice);
        let assignment = Assignment::from_slots(vec![3, 0, 2, 1]).unwrap();

        for i in 0..4 {
            for j in 0..4 {
                let before = objective.total_distance(&assignment);
                let mut swapped = assignment.clone();
                swapped.swap(i, j);
                let after = objective.total_distance(&swapped);
                let delta = objective.swap_delta(&assignment, i, j);
                assert!(
                    (delta - (after - before)).abs() < 1e-9,
                    "swap ({}, {}): delta {} vs {}",
                    i,
                    j,
                    delta,
                    after - before
                );
            }
        }
    }

    #[test]
    fn test_swap_of_connected_pair_only() {
        // Two entities joined by one edge: swapping them never changes the length.
        let graph = GraphInput::from_pairs(1..=2, &[(1, 2)]).to_graph().unwrap();
        let lattice = Lattice::generate(2, 80.0);
        let objective = Objective::new(&graph, &lattice);
        assert_eq!(objective.swap_delta(&Assignment::identity(2), 0, 1), 0.0);
    }

    #[test]
    fn test_distance_matrix_agrees() {
        let graph = square_graph();
        let lattice = Lattice::generate(4, 80.0);
        let matrix = DistanceMatrix::from_lattice(&lattice);
        let assignment = Assignment::from_slots(vec![1, 3, 0, 2]).unwrap();
        let objective = Objective::new(&graph, &lattice);
        assert!(
            (matrix.total_distance(&graph, &assignment) - objective.total_distance(&assignment))
                .abs()
                < 1e-9
        );
        assert_eq!(matrix.get(2, 2), 0.0);
        assert_eq!(matrix.get(0, 3), matrix.get(3, 0));
    }
}
