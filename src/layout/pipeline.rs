//! Stage orchestration
//!
//! Runs lattice → (random baseline) → greedy → local search → relaxation and
//! records one [`RunMetrics`] per stage. Every randomised stage draws from the
//! same seeded generator, in stage order, so a seed reproduces a whole run.

use std::collections::HashMap;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::InputError;
use crate::graph::{EntityId, Graph, GraphInput, GraphStats};

use super::config::OptimizerConfig;
use super::greedy::{greedy_assignment, random_assignment};
use super::lattice::Lattice;
use super::lint::{self, LintWarning};
use super::objective::{EdgeStats, Objective};
use super::relax::relax;
use super::search::local_search;
use super::types::{
    Assignment, BoundingBox, ConvergenceSample, Point, RunMetrics, Stage, StageOutcome,
};

/// Final placement of one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedEntity {
    pub id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub degree: usize,
    /// Lattice slot after local search
    pub slot: usize,
    pub x: f64,
    pub y: f64,
}

/// Two entities left closer than the separation floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeparationReport {
    pub a: EntityId,
    pub b: EntityId,
    pub distance: f64,
}

/// Everything a run produces
#[derive(Debug, Clone, Serialize)]
pub struct LayoutOutput {
    pub seed: u64,
    pub spacing: f64,
    /// In graph index order (input order after truncation)
    pub entities: Vec<PlacedEntity>,
    /// Entity index → lattice slot after local search
    pub assignment: Assignment,
    pub metrics: Vec<RunMetrics>,
    pub convergence: Vec<ConvergenceSample>,
    pub separation_violations: Vec<SeparationReport>,
    pub warnings: Vec<LintWarning>,
    pub graph_stats: GraphStats,
    pub bounds: BoundingBox,
}

impl LayoutOutput {
    /// Metrics of a given stage, if it ran
    pub fn stage(&self, stage: Stage) -> Option<&RunMetrics> {
        self.metrics.iter().find(|m| m.stage == stage)
    }

    /// Metrics of the last stage that ran
    pub fn final_metrics(&self) -> Option<&RunMetrics> {
        self.metrics.last()
    }

    /// Final coordinates in entity index order
    pub fn points(&self) -> Vec<Point> {
        self.entities.iter().map(|e| Point::new(e.x, e.y)).collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Append-only per-stage record, computing changes against earlier stages
#[derive(Debug, Default)]
struct MetricsLog {
    records: Vec<RunMetrics>,
}

impl MetricsLog {
    fn push(&mut self, stage: Stage, stats: &EdgeStats, outcome: StageOutcome) {
        let record = RunMetrics::record(
            stage,
            stats,
            outcome,
            self.records.last(),
            self.records.first(),
        );
        info!(
            stage = %stage,
            total = record.total_distance,
            average = record.average_distance,
            iterations = record.iterations,
            "stage complete"
        );
        self.records.push(record);
    }
}

/// Validate, build the graph, truncate to `target_count` and run every stage.
pub fn optimize(input: &GraphInput, config: &OptimizerConfig) -> Result<LayoutOutput, InputError> {
    config.validate()?;
    let mut graph = input.to_graph()?;
    if let Some(target) = config.target_count {
        graph = graph.truncate(target)?;
    }
    let mut output = optimize_graph(&graph, config)?;

    let names: HashMap<EntityId, &str> = input
        .entities
        .iter()
        .filter_map(|e| e.name.as_deref().map(|name| (e.id, name)))
        .collect();
    if !names.is_empty() {
        for entity in &mut output.entities {
            entity.name = names.get(&entity.id).map(|name| name.to_string());
        }
    }
    Ok(output)
}

/// Run every stage on an already built graph. `target_count` is not applied here.
pub fn optimize_graph(graph: &Graph, config: &OptimizerConfig) -> Result<LayoutOutput, InputError> {
    config.validate()?;
    graph.ensure_optimizable()?;

    let n = graph.len();
    info!(
        entities = n,
        edges = graph.edge_count(),
        seed = config.random_seed,
        "optimising layout"
    );

    let lattice = Lattice::generate(n, config.spacing);
    let objective = Objective::new(graph, &lattice);
    let mut rng = StdRng::seed_from_u64(config.random_seed);
    let mut log = MetricsLog::default();

    if config.include_random_baseline {
        let start = Instant::now();
        let baseline = random_assignment(n, &mut rng);
        log.push(
            Stage::RandomBaseline,
            &objective.edge_stats(&baseline),
            StageOutcome::completed(start.elapsed()),
        );
    }

    let start = Instant::now();
    let greedy = greedy_assignment(graph, &lattice);
    log.push(
        Stage::Greedy,
        &objective.edge_stats(&greedy),
        StageOutcome::completed(start.elapsed()),
    );

    let search = local_search(&objective, greedy, &config.search, &mut rng);
    log.push(
        Stage::LocalSearch,
        &objective.edge_stats(&search.assignment),
        search.outcome,
    );

    let discrete = search.assignment.points(&lattice);
    let points = if config.relax.enabled {
        let relaxed = relax(graph, &discrete, &config.relax);
        log.push(
            Stage::Relaxation,
            &EdgeStats::from_points(graph, &relaxed.points),
            relaxed.outcome,
        );
        relaxed.points
    } else {
        discrete
    };

    let min_distance = config.relax.min_distance;
    let separation_violations: Vec<SeparationReport> = lint::check_separation(&points, min_distance)
        .into_iter()
        .map(|v| SeparationReport {
            a: graph.id(v.a),
            b: graph.id(v.b),
            distance: v.distance,
        })
        .collect();
    if !separation_violations.is_empty() {
        warn!(
            count = separation_violations.len(),
            min_distance, "entities closer than the minimum separation"
        );
    }
    let warnings = lint::check(graph, &points, min_distance);

    let entities = points
        .iter()
        .enumerate()
        .map(|(i, p)| PlacedEntity {
            id: graph.id(i),
            name: None,
            degree: graph.degree(i),
            slot: search.assignment.slot(i),
            x: p.x,
            y: p.y,
        })
        .collect();

    Ok(LayoutOutput {
        seed: config.random_seed,
        spacing: config.spacing,
        entities,
        bounds: BoundingBox::from_points(&points),
        assignment: search.assignment,
        metrics: log.records,
        convergence: search.history,
        separation_violations,
        warnings,
        graph_stats: graph.stats().clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::config::RelaxConfig;
    use pretty_assertions::assert_eq;

    fn path_input() -> GraphInput {
        GraphInput::from_pairs(1..=4, &[(1, 2), (2, 3), (3, 4)])
    }

    #[test]
    fn test_stage_sequence() {
        let output = optimize(&path_input(), &OptimizerConfig::default()).unwrap();
        let stages: Vec<Stage> = output.metrics.iter().map(|m| m.stage).collect();
        assert_eq!(
            stages,
            vec![
                Stage::RandomBaseline,
                Stage::Greedy,
                Stage::LocalSearch,
                Stage::Relaxation
            ]
        );
        assert_eq!(output.metrics[0].change_vs_previous, None);
        assert_eq!(output.metrics[0].change_vs_baseline, None);
        for m in &output.metrics[1..] {
            assert!(m.change_vs_previous.is_some());
            assert!(m.change_vs_baseline.is_some());
        }
    }

    #[test]
    fn test_skipping_stages() {
        let config = OptimizerConfig::new()
            .with_random_baseline(false)
            .without_relaxation();
        let output = optimize(&path_input(), &config).unwrap();
        let stages: Vec<Stage> = output.metrics.iter().map(|m| m.stage).collect();
        assert_eq!(stages, vec![Stage::Greedy, Stage::LocalSearch]);
        // Without relaxation the coordinates are the lattice slots.
        let lattice = Lattice::generate(4, config.spacing);
        assert_eq!(output.points(), output.assignment.points(&lattice));
    }

    #[test]
    fn test_path_local_search_not_worse_than_greedy() {
        let output = optimize(&path_input(), &OptimizerConfig::default()).unwrap();
        let greedy = output.stage(Stage::Greedy).unwrap();
        let search = output.stage(Stage::LocalSearch).unwrap();
        assert!(search.total_distance <= greedy.total_distance + 1e-9);
        assert_eq!(search.edge_count, 3);
    }

    #[test]
    fn test_names_carried_through() {
        let input = GraphInput::from_json(
            r#"{"entities": [{"id": 1, "name": "alpha"}, {"id": 2}],
                "edges": [{"source": 1, "target": 2}]}"#,
        )
        .unwrap();
        let output = optimize(&input, &OptimizerConfig::default()).unwrap();
        assert_eq!(output.entities[0].name.as_deref(), Some("alpha"));
        assert_eq!(output.entities[1].name, None);
    }

    #[test]
    fn test_truncation_applied() {
        let input = GraphInput::from_pairs(1..=6, &[(1, 2), (2, 3), (3, 4), (5, 6)]);
        let config = OptimizerConfig::new().with_target_count(3);
        let output = optimize(&input, &config).unwrap();
        assert_eq!(output.entities.len(), 3);
        assert_eq!(output.graph_stats.truncated_entities, 3);
        assert_eq!(output.graph_stats.truncated_edges, 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = OptimizerConfig::new().with_spacing(-1.0);
        let err = optimize(&path_input(), &config).unwrap_err();
        assert!(matches!(err, InputError::InvalidConfig { .. }));
    }

    #[test]
    fn test_single_entity() {
        let input = GraphInput::from_pairs([9], &[]);
        let output = optimize(&input, &OptimizerConfig::default()).unwrap();
        assert_eq!(output.entities.len(), 1);
        assert_eq!(output.entities[0].slot, 0);
        assert_eq!(output.final_metrics().unwrap().edge_count, 0);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_violations_reported_when_floor_exceeds_spacing() {
        // Relaxation can only move 1 unit per step, so a floor far above the
        // lattice spacing is still violated when the iteration budget runs out.
        let config = OptimizerConfig::new().with_spacing(1.0).with_relax(RelaxConfig {
            max_iterations: 1,
            max_step: 1.0,
            separation_passes: 0,
            min_distance: 60.0,
            ..RelaxConfig::default()
        });
        let output = optimize(&path_input(), &config).unwrap();
        assert!(!output.separation_violations.is_empty());
        assert!(output
            .warnings
            .iter()
            .any(|w| w.category == lint::LintCategory::Overlap));
    }

    #[test]
    fn test_output_serialises() {
        let output = optimize(&path_input(), &OptimizerConfig::default()).unwrap();
        let json = output.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["entities"].as_array().unwrap().len(), 4);
        assert_eq!(value["metrics"][1]["stage"], "greedy");
        assert_eq!(value["seed"], 42);
    }
}
