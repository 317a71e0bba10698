//! Core types for the layout optimiser

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::lattice::Lattice;
use super::objective::EdgeStats;

/// A 2D point in the coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Distance from the origin
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Axis-aligned bounds of a coordinate set
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a zero-sized bounding box at the origin
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Smallest box containing every point (zero box for no points)
    pub fn from_points(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Self::zero();
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::zero()
    }
}

/// Bijection from entity index to lattice position index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Assignment {
    slots: Vec<usize>,
}

impl Assignment {
    /// Entity `k` at position `k`
    pub fn identity(n: usize) -> Self {
        Self {
            slots: (0..n).collect(),
        }
    }

    /// Wrap a slot vector, returning `None` unless it is a permutation of `0..len`
    pub fn from_slots(slots: Vec<usize>) -> Option<Self> {
        let assignment = Self { slots };
        assignment.is_bijection().then_some(assignment)
    }

    /// Position index of an entity
    #[inline]
    pub fn slot(&self, entity: usize) -> usize {
        self.slots[entity]
    }

    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Exchange the positions of two entities
    #[inline]
    pub fn swap(&mut self, i: usize, j: usize) {
        self.slots.swap(i, j);
    }

    /// Every position index in `0..len` used exactly once
    pub fn is_bijection(&self) -> bool {
        let mut seen = vec![false; self.slots.len()];
        for &slot in &self.slots {
            match seen.get_mut(slot) {
                Some(flag) if !*flag => *flag = true,
                _ => return false,
            }
        }
        true
    }

    /// Position index -> entity index
    pub fn inverse(&self) -> Vec<usize> {
        let mut inverse = vec![0; self.slots.len()];
        for (entity, &slot) in self.slots.iter().enumerate() {
            inverse[slot] = entity;
        }
        inverse
    }

    /// Coordinates of every entity under this assignment
    pub fn points(&self, lattice: &Lattice) -> Vec<Point> {
        self.slots.iter().map(|&slot| lattice.point(slot)).collect()
    }
}

/// Pipeline stage that produced a metrics record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RandomBaseline,
    Greedy,
    LocalSearch,
    Relaxation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::RandomBaseline => write!(f, "random_baseline"),
            Stage::Greedy => write!(f, "greedy"),
            Stage::LocalSearch => write!(f, "local_search"),
            Stage::Relaxation => write!(f, "relaxation"),
        }
    }
}

/// Why a stage stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Single-shot stage, no iteration
    Completed,
    /// Iteration cap reached
    MaxIterations,
    /// Too many consecutive non-improving swaps
    Stagnation,
    /// Relative improvement stayed below epsilon for the patience window
    Converged,
    /// Settled, but some pairs are still closer than the separation floor
    SeparationUnresolved,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Completed => write!(f, "completed"),
            StopReason::MaxIterations => write!(f, "max_iterations"),
            StopReason::Stagnation => write!(f, "stagnation"),
            StopReason::Converged => write!(f, "converged"),
            StopReason::SeparationUnresolved => write!(f, "separation_unresolved"),
        }
    }
}

/// What a stage reports about its own run, before the pipeline adds objective values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageOutcome {
    pub iterations: u64,
    pub accepted_swaps: u64,
    pub stop_reason: StopReason,
    pub converged: bool,
    pub elapsed: Duration,
    /// Objective got worse than the stage input
    pub regressed: bool,
    /// The stage result was discarded in favour of its input
    pub rejected: bool,
}

impl StageOutcome {
    /// Outcome of a single-shot stage
    pub fn completed(elapsed: Duration) -> Self {
        Self {
            iterations: 0,
            accepted_swaps: 0,
            stop_reason: StopReason::Completed,
            converged: true,
            elapsed,
            regressed: false,
            rejected: false,
        }
    }
}

/// Immutable per-stage snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    pub stage: Stage,
    pub edge_count: usize,
    pub total_distance: f64,
    pub average_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub iterations: u64,
    pub accepted_swaps: u64,
    pub stop_reason: StopReason,
    pub converged: bool,
    pub elapsed: Duration,
    /// Percent change of the average distance vs the preceding stage
    pub change_vs_previous: Option<f64>,
    /// Percent change of the average distance vs the first stage
    pub change_vs_baseline: Option<f64>,
    pub regressed: bool,
    pub rejected: bool,
}

impl RunMetrics {
    /// Combine objective values and a stage outcome into a record
    pub fn record(
        stage: Stage,
        stats: &EdgeStats,
        outcome: StageOutcome,
        previous: Option<&RunMetrics>,
        baseline: Option<&RunMetrics>,
    ) -> Self {
        let average = stats.average();
        Self {
            stage,
            edge_count: stats.edge_count,
            total_distance: stats.total,
            average_distance: average,
            min_distance: stats.min,
            max_distance: stats.max,
            iterations: outcome.iterations,
            accepted_swaps: outcome.accepted_swaps,
            stop_reason: outcome.stop_reason,
            converged: outcome.converged,
            elapsed: outcome.elapsed,
            change_vs_previous: previous.and_then(|p| percent_change(p.average_distance, average)),
            change_vs_baseline: baseline.and_then(|b| percent_change(b.average_distance, average)),
            regressed: outcome.regressed,
            rejected: outcome.rejected,
        }
    }
}

/// `(to - from) / from` in percent; `None` when `from` is not positive
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    (from > 0.0).then(|| (to - from) / from * 100.0)
}

fn format_change(change: f64) -> String {
    let arrow = if change < 0.0 { '↓' } else { '↑' };
    format!("{}{:.1}%", arrow, change.abs())
}

impl fmt::Display for RunMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stage: {}", self.stage)?;
        writeln!(f, "Edge count: {}", self.edge_count)?;
        writeln!(f, "Total distance: {:.2}", self.total_distance)?;
        writeln!(f, "Avg distance: {:.2}", self.average_distance)?;
        writeln!(f, "Min distance: {:.2}", self.min_distance)?;
        writeln!(f, "Max distance: {:.2}", self.max_distance)?;
        writeln!(
            f,
            "Iterations: {} (accepted swaps: {})",
            self.iterations, self.accepted_swaps
        )?;
        write!(
            f,
            "Stopped: {} (converged: {}), {:.2}s",
            self.stop_reason,
            self.converged,
            self.elapsed.as_secs_f64()
        )?;
        if let Some(change) = self.change_vs_previous {
            write!(f, "\nvs previous: {}", format_change(change))?;
        }
        if let Some(change) = self.change_vs_baseline {
            write!(f, "\nvs baseline: {}", format_change(change))?;
        }
        if self.regressed {
            let action = if self.rejected { "rejected" } else { "kept" };
            write!(f, "\nregressed vs input ({})", action)?;
        }
        Ok(())
    }
}

/// Objective value sampled during local search
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConvergenceSample {
    pub iteration: u64,
    pub total_distance: f64,
    pub accepted_swaps: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        assert_eq!(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0);
        assert_eq!(Point::new(-3.0, 4.0).norm(), 5.0);
    }

    #[test]
    fn test_bounding_box_from_points() {
        let bounds = BoundingBox::from_points(&[
            Point::new(1.0, -2.0),
            Point::new(-3.0, 4.0),
            Point::new(0.0, 0.0),
        ]);
        assert_eq!(bounds, BoundingBox::new(-3.0, -2.0, 4.0, 6.0));
        assert_eq!(BoundingBox::from_points(&[]), BoundingBox::zero());
    }

    #[test]
    fn test_assignment_bijection() {
        assert!(Assignment::from_slots(vec![2, 0, 1]).is_some());
        assert!(Assignment::from_slots(vec![0, 0, 1]).is_none());
        assert!(Assignment::from_slots(vec![0, 3, 1]).is_none());
    }

    #[test]
    fn test_assignment_swap_and_inverse() {
        let mut assignment = Assignment::identity(3);
        assignment.swap(0, 2);
        assert_eq!(assignment.slots(), &[2, 1, 0]);
        assert_eq!(assignment.inverse(), vec![2, 1, 0]);
        assert!(assignment.is_bijection());
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(200.0, 150.0), Some(-25.0));
        assert_eq!(percent_change(0.0, 10.0), None);
    }

    #[test]
    fn test_metrics_display() {
        let stats = EdgeStats {
            edge_count: 3,
            total: 240.0,
            min: 70.0,
            max: 90.0,
        };
        let baseline = RunMetrics::record(
            Stage::RandomBaseline,
            &EdgeStats {
                edge_count: 3,
                total: 300.0,
                min: 90.0,
                max: 110.0,
            },
            StageOutcome::completed(Duration::ZERO),
            None,
            None,
        );
        let outcome = StageOutcome {
            iterations: 500,
            accepted_swaps: 4,
            stop_reason: StopReason::Stagnation,
            converged: true,
            elapsed: Duration::from_millis(250),
            regressed: false,
            rejected: false,
        };
        let metrics = RunMetrics::record(
            Stage::LocalSearch,
            &stats,
            outcome,
            Some(&baseline),
            Some(&baseline),
        );
        insta::assert_snapshot!(metrics.to_string(), @r"
        Stage: local_search
        Edge count: 3
        Total distance: 240.00
        Avg distance: 80.00
        Min distance: 70.00
        Max distance: 90.00
        Iterations: 500 (accepted swaps: 4)
        Stopped: stagnation (converged: true), 0.25s
        vs previous: ↓20.0%
        vs baseline: ↓20.0%
        ");
    }
}
