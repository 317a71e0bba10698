//! Golden-angle (Vogel) spiral lattice of candidate positions

use serde::Serialize;

use super::types::Point;

/// Golden ratio φ
pub const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// 360°·(1 − 1/φ), roughly 137.5°
pub const GOLDEN_ANGLE_DEGREES: f64 = 360.0 * (1.0 - 1.0 / GOLDEN_RATIO);

/// Spacing that keeps neighbouring spiral arms apart for typical node sizes
pub const DEFAULT_SPACING: f64 = 80.0;

/// One lattice slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub index: usize,
    pub point: Point,
    /// Distance from the spiral origin; ascending with `index`
    pub radius: f64,
}

/// Spiral position for slot `index`
pub fn spiral_point(index: usize, spacing: f64) -> Point {
    let radius = spacing * ((index + 1) as f64).sqrt();
    let theta = (index as f64 * GOLDEN_ANGLE_DEGREES).to_radians();
    Point::new(radius * theta.cos(), radius * theta.sin())
}

/// Immutable set of N candidate positions
///
/// Slot `k` has radius `spacing·√(k+1)`, so index order is already the centrality
/// ranking (most central first).
#[derive(Debug, Clone)]
pub struct Lattice {
    positions: Vec<Position>,
}

impl Lattice {
    pub fn generate(n: usize, spacing: f64) -> Self {
        let positions = (0..n)
            .map(|index| Position {
                index,
                point: spiral_point(index, spacing),
                radius: spacing * ((index + 1) as f64).sqrt(),
            })
            .collect();
        Self { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn point(&self, index: usize) -> Point {
        self.positions[index].point
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Slot indices from most to least central
    pub fn by_centrality(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions.iter().map(|p| p.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_angle() {
        assert!((GOLDEN_ANGLE_DEGREES - 137.507_764).abs() < 1e-5);
    }

    #[test]
    fn test_first_slot() {
        let lattice = Lattice::generate(1, 80.0);
        assert_eq!(lattice.point(0), Point::new(80.0, 0.0));
    }

    #[test]
    fn test_radius_non_decreasing() {
        let lattice = Lattice::generate(500, DEFAULT_SPACING);
        assert_eq!(lattice.len(), 500);
        for pair in lattice.positions().windows(2) {
            assert!(pair[0].radius <= pair[1].radius);
            assert!(pair[0].point.norm() <= pair[1].point.norm() + 1e-9);
        }
    }

    #[test]
    fn test_points_distinct() {
        let lattice = Lattice::generate(300, 10.0);
        let points = lattice.positions();
        for i in 0..points.len() {
            for j in i + 1..points.len() {
                assert!(points[i].point.distance(points[j].point) > 1e-6);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let a = Lattice::generate(64, 55.0);
        let b = Lattice::generate(64, 55.0);
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn test_by_centrality_is_index_order() {
        let lattice = Lattice::generate(5, 1.0);
        assert_eq!(lattice.by_centrality().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }
}
