//! Force-directed refinement of the discrete layout
//!
//! Entities leave the lattice and move freely under three forces: springs along
//! edges, short-range repulsion below `min_distance`, and a weak anchor back to
//! the lattice position they started from. After every step a few projection
//! passes push overlapping pairs apart so the separation constraint holds even
//! when the forces alone would violate it.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::graph::Graph;

use super::config::{RegressionPolicy, RelaxConfig};
use super::grid::SpatialGrid;
use super::lint::check_separation;
use super::objective::total_distance_of_points;
use super::types::{Point, StageOutcome, StopReason};

/// Distances below this are treated as coincident
const MIN_SEPARATION_EPSILON: f64 = 1e-6;

/// Projection pushes pairs slightly past `min_distance` so rounding does not
/// flag them again on the next pass
const SEPARATION_SLACK: f64 = 1e-6;

/// Iterations between debug progress lines
const PROGRESS_INTERVAL: u64 = 10;

/// Result of the continuous phase
#[derive(Debug, Clone)]
pub struct RelaxResult {
    /// Final coordinates; the input coordinates if the result was rejected
    pub points: Vec<Point>,
    pub outcome: StageOutcome,
    pub initial_total: f64,
    /// Total of the relaxed coordinates, whether or not they were kept
    pub relaxed_total: f64,
    pub final_total: f64,
}

/// Unit direction from `from` to `to` and the clamped distance between them.
///
/// Coincident points get the fixed direction `(1, 0)`.
fn direction(from: Point, to: Point) -> (f64, f64, f64) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let dist = dx.hypot(dy);
    if dist < MIN_SEPARATION_EPSILON {
        (1.0, 0.0, MIN_SEPARATION_EPSILON)
    } else {
        (dx / dist, dy / dist, dist)
    }
}

/// Relax `start` under `config`, keeping `start` if the policy rejects a regression.
///
/// A regression is only rejected when `start` itself satisfies `min_distance`.
/// The run counts as converged only if it settled and no pair is left closer
/// than `min_distance`.
pub fn relax(graph: &Graph, start: &[Point], config: &RelaxConfig) -> RelaxResult {
    let clock = Instant::now();
    let n = start.len();
    let initial_total = total_distance_of_points(graph, start);

    if n < 2 {
        return RelaxResult {
            points: start.to_vec(),
            outcome: StageOutcome::completed(clock.elapsed()),
            initial_total,
            relaxed_total: initial_total,
            final_total: initial_total,
        };
    }

    let mut relaxer = Relaxer::new(graph, start, config);
    let mut previous = initial_total;
    let mut stalled = 0u32;
    let mut iterations = 0u64;
    let mut settled = false;

    debug!(
        entities = n,
        max_iterations = config.max_iterations,
        min_distance = config.min_distance,
        "starting relaxation"
    );

    while iterations < config.max_iterations {
        iterations += 1;
        let max_move = relaxer.step();
        relaxer.enforce_separation();

        let current = total_distance_of_points(graph, &relaxer.points);
        let improvement = if previous > 0.0 {
            (previous - current) / previous
        } else {
            0.0
        };
        if improvement < config.epsilon {
            stalled += 1;
        } else {
            stalled = 0;
        }
        previous = current;

        if iterations % PROGRESS_INTERVAL == 0 {
            debug!(iterations, total = current, max_move, "relaxation progress");
        }
        if stalled >= config.patience {
            settled = true;
            break;
        }
    }

    let relaxed_total = total_distance_of_points(graph, &relaxer.points);
    let regressed = relaxed_total > initial_total;
    let reject_regression = regressed && config.regression_policy == RegressionPolicy::Reject;
    let start_separated = check_separation(start, config.min_distance).is_empty();
    let rejected = reject_regression && start_separated;
    if reject_regression && !start_separated {
        warn!(
            before = initial_total,
            after = relaxed_total,
            "discrete layout violates min_distance, keeping relaxed layout despite regression"
        );
    }
    let points = if rejected {
        warn!(
            before = initial_total,
            after = relaxed_total,
            "relaxation increased total distance, keeping discrete layout"
        );
        start.to_vec()
    } else {
        if regressed && config.regression_policy == RegressionPolicy::Accept {
            warn!(
                before = initial_total,
                after = relaxed_total,
                "relaxation increased total distance"
            );
        }
        relaxer.points
    };
    let final_total = if rejected { initial_total } else { relaxed_total };

    let violations = check_separation(&points, config.min_distance).len();
    let converged = settled && violations == 0;
    let stop_reason = match (settled, violations) {
        (true, 0) => StopReason::Converged,
        (true, _) => {
            warn!(violations, "relaxation settled with pairs below min_distance");
            StopReason::SeparationUnresolved
        }
        (false, _) => StopReason::MaxIterations,
    };
    info!(
        iterations,
        converged,
        violations,
        initial = initial_total,
        total = final_total,
        "relaxation finished"
    );

    RelaxResult {
        points,
        outcome: StageOutcome {
            iterations,
            accepted_swaps: 0,
            stop_reason,
            converged,
            elapsed: clock.elapsed(),
            regressed,
            rejected,
        },
        initial_total,
        relaxed_total,
        final_total,
    }
}

/// Mutable state of one relaxation run
struct Relaxer<'a> {
    graph: &'a Graph,
    config: &'a RelaxConfig,
    origin: Vec<Point>,
    points: Vec<Point>,
    forces: Vec<(f64, f64)>,
    /// `None` when `min_distance` is zero and nothing can overlap
    grid: Option<SpatialGrid>,
}

impl<'a> Relaxer<'a> {
    fn new(graph: &'a Graph, start: &[Point], config: &'a RelaxConfig) -> Self {
        Self {
            graph,
            config,
            origin: start.to_vec(),
            points: start.to_vec(),
            forces: vec![(0.0, 0.0); start.len()],
            grid: (config.min_distance > 0.0).then(|| SpatialGrid::new(config.min_distance)),
        }
    }

    /// Accumulate forces and move every entity; returns the largest displacement
    fn step(&mut self) -> f64 {
        self.forces.fill((0.0, 0.0));
        self.add_attraction();
        self.add_repulsion();
        self.add_anchor();

        let mut max_move: f64 = 0.0;
        for (p, &(fx, fy)) in self.points.iter_mut().zip(&self.forces) {
            let mut sx = fx * self.config.step_size;
            let mut sy = fy * self.config.step_size;
            let len = sx.hypot(sy);
            if len > self.config.max_step {
                let scale = self.config.max_step / len;
                sx *= scale;
                sy *= scale;
            }
            p.x += sx;
            p.y += sy;
            max_move = max_move.max(sx.hypot(sy));
        }
        max_move
    }

    fn add_attraction(&mut self) {
        let strength = self.config.attraction_strength;
        if strength == 0.0 {
            return;
        }
        for edge in self.graph.edges() {
            let (ux, uy, dist) = direction(self.points[edge.a], self.points[edge.b]);
            let magnitude = strength * (dist - self.config.rest_length);
            self.forces[edge.a].0 += ux * magnitude;
            self.forces[edge.a].1 += uy * magnitude;
            self.forces[edge.b].0 -= ux * magnitude;
            self.forces[edge.b].1 -= uy * magnitude;
        }
    }

    fn add_repulsion(&mut self) {
        let strength = self.config.repulsion_strength;
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        if strength == 0.0 {
            return;
        }
        grid.rebuild(&self.points);
        for pair in grid.close_pairs(&self.points) {
            let (ux, uy, dist) = direction(self.points[pair.a], self.points[pair.b]);
            let magnitude = strength * (self.config.min_distance - dist);
            self.forces[pair.a].0 -= ux * magnitude;
            self.forces[pair.a].1 -= uy * magnitude;
            self.forces[pair.b].0 += ux * magnitude;
            self.forces[pair.b].1 += uy * magnitude;
        }
    }

    fn add_anchor(&mut self) {
        let strength = self.config.anchor_strength;
        for ((force, p), o) in self.forces.iter_mut().zip(&self.points).zip(&self.origin) {
            force.0 += strength * (o.x - p.x);
            force.1 += strength * (o.y - p.y);
        }
    }

    /// Push pairs closer than `min_distance` apart, splitting the correction
    /// evenly. Stops early once a pass finds nothing to fix.
    fn enforce_separation(&mut self) {
        let min_distance = self.config.min_distance;
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        for _ in 0..self.config.separation_passes {
            grid.rebuild(&self.points);
            let pairs = grid.close_pairs(&self.points);
            if pairs.is_empty() {
                return;
            }
            for pair in pairs {
                // Earlier corrections in this pass may already have moved the pair.
                let (ux, uy, dist) = direction(self.points[pair.a], self.points[pair.b]);
                if dist >= min_distance {
                    continue;
                }
                let half = (min_distance + SEPARATION_SLACK - dist) / 2.0;
                self.points[pair.a].x -= ux * half;
                self.points[pair.a].y -= uy * half;
                self.points[pair.b].x += ux * half;
                self.points[pair.b].y += uy * half;
            }
        }
    }
}
