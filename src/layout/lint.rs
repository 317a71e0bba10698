//! Lint checks for finished layouts.
//!
//! Runs after the last stage to report mechanical defects: entities closer than
//! the separation floor, and entities with no edges whose position carries no
//! meaning.

use std::fmt;

use serde::Serialize;

use crate::graph::{EntityId, Graph};

use super::grid::SpatialGrid;
use super::types::Point;

/// Shortfall below `min_distance` that still counts as separated
pub const SEPARATION_TOLERANCE: f64 = 1e-6;

/// A lint warning about a layout defect
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LintWarning {
    pub category: LintCategory,
    pub message: String,
}

/// Category of lint defect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LintCategory {
    Overlap,
    Isolated,
}

impl fmt::Display for LintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintCategory::Overlap => write!(f, "overlap"),
            LintCategory::Isolated => write!(f, "isolated"),
        }
    }
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Two entities (by index) closer than the separation floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeparationViolation {
    pub a: usize,
    pub b: usize,
    pub distance: f64,
}

/// Every pair closer than `min_distance` (beyond [`SEPARATION_TOLERANCE`]).
///
/// Pairs come out ordered by `(a, b)`. A zero floor never reports anything.
pub fn check_separation(points: &[Point], min_distance: f64) -> Vec<SeparationViolation> {
    if min_distance <= 0.0 {
        return Vec::new();
    }
    let mut grid = SpatialGrid::new(min_distance);
    grid.rebuild(points);
    let mut violations: Vec<SeparationViolation> = grid
        .close_pairs(points)
        .into_iter()
        .filter(|pair| pair.distance < min_distance - SEPARATION_TOLERANCE)
        .map(|pair| SeparationViolation {
            a: pair.a,
            b: pair.b,
            distance: pair.distance,
        })
        .collect();
    violations.sort_by(|x, y| (x.a, x.b).cmp(&(y.a, y.b)));
    violations
}

/// Run all lint checks on final coordinates.
pub fn check(graph: &Graph, points: &[Point], min_distance: f64) -> Vec<LintWarning> {
    let mut warnings = Vec::new();
    check_overlaps(graph, points, min_distance, &mut warnings);
    check_isolated(graph, &mut warnings);
    warnings
}

fn display_name(id: EntityId) -> String {
    format!("\"{}\"", id)
}

fn check_overlaps(
    graph: &Graph,
    points: &[Point],
    min_distance: f64,
    warnings: &mut Vec<LintWarning>,
) {
    for v in check_separation(points, min_distance) {
        warnings.push(LintWarning {
            category: LintCategory::Overlap,
            message: format!(
                "entities {} and {} are {:.1} apart (minimum {:.1})",
                display_name(graph.id(v.a)),
                display_name(graph.id(v.b)),
                v.distance,
                min_distance
            ),
        });
    }
}

fn check_isolated(graph: &Graph, warnings: &mut Vec<LintWarning>) {
    if graph.len() < 2 {
        return;
    }
    for i in (0..graph.len()).filter(|&i| graph.degree(i) == 0) {
        warnings.push(LintWarning {
            category: LintCategory::Isolated,
            message: format!(
                "entity {} has no edges; its position is arbitrary",
                display_name(graph.id(i))
            ),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphInput;

    fn pair_graph() -> Graph {
        GraphInput::from_pairs([7, 9], &[(7, 9)]).to_graph().unwrap()
    }

    // ── Separation tests ──

    #[test]
    fn test_overlap_detected() {
        let points = [Point::new(0.0, 0.0), Point::new(30.0, 40.0)];
        let violations = check_separation(&points, 60.0);
        assert_eq!(
            violations,
            vec![SeparationViolation {
                a: 0,
                b: 1,
                distance: 50.0
            }]
        );
    }

    #[test]
    fn test_exact_floor_is_not_overlap() {
        let points = [Point::new(0.0, 0.0), Point::new(60.0, 0.0)];
        assert!(check_separation(&points, 60.0).is_empty());
        // Within tolerance of the floor.
        let points = [Point::new(0.0, 0.0), Point::new(60.0 - 1e-9, 0.0)];
        assert!(check_separation(&points, 60.0).is_empty());
    }

    #[test]
    fn test_zero_floor_disables_check() {
        let points = [Point::new(1.0, 1.0), Point::new(1.0, 1.0)];
        assert!(check_separation(&points, 0.0).is_empty());
    }

    #[test]
    fn test_violations_sorted() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(500.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(505.0, 0.0),
        ];
        let pairs: Vec<(usize, usize)> = check_separation(&points, 60.0)
            .iter()
            .map(|v| (v.a, v.b))
            .collect();
        assert_eq!(pairs, vec![(0, 2), (1, 3)]);
    }

    // ── Lint warnings ──

    #[test]
    fn test_overlap_warning_names_entities() {
        let graph = pair_graph();
        let points = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let warnings = check(&graph, &points, 60.0);
        assert_eq!(warnings.len(), 1);
        insta::assert_snapshot!(
            warnings[0].to_string(),
            @r#"[overlap] entities "7" and "9" are 10.0 apart (minimum 60.0)"#
        );
    }

    #[test]
    fn test_isolated_entity_reported() {
        let graph = GraphInput::from_pairs([1, 2, 3], &[(1, 2)])
            .to_graph()
            .unwrap();
        let points = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(200.0, 0.0),
        ];
        let warnings = check(&graph, &points, 60.0);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, LintCategory::Isolated);
        assert!(warnings[0].message.contains("\"3\""));
    }

    #[test]
    fn test_clean_layout() {
        let graph = pair_graph();
        let points = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        assert!(check(&graph, &points, 60.0).is_empty());
    }
}
