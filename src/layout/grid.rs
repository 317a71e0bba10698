//! Uniform bucket grid for close-pair queries
//!
//! With a cell size equal to the query radius, every pair closer than the
//! radius lies in the same or an adjacent cell, so a 3×3 neighbourhood scan
//! finds all of them. Buckets hold indices in ascending order and lookups never
//! iterate the map, which keeps pair order independent of hashing.

use std::collections::HashMap;

use super::types::Point;

type Cell = (i64, i64);

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<Cell, Vec<usize>>,
}

/// A pair `(a, b)` with `a < b` closer than the query radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosePair {
    pub a: usize,
    pub b: usize,
    pub distance: f64,
}

impl SpatialGrid {
    /// `cell_size` must be positive
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, p: Point) -> Cell {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }

    /// Re-bucket all points
    pub fn rebuild(&mut self, points: &[Point]) {
        self.cells.clear();
        for (i, &p) in points.iter().enumerate() {
            let cell = self.cell_of(p);
            self.cells.entry(cell).or_default().push(i);
        }
    }

    /// All pairs closer than the cell size, ordered by `a` then scan order.
    ///
    /// Call [`SpatialGrid::rebuild`] with the same `points` first.
    pub fn close_pairs(&self, points: &[Point]) -> Vec<ClosePair> {
        let radius = self.cell_size;
        let mut pairs = Vec::new();
        for (a, &p) in points.iter().enumerate() {
            let (cx, cy) = self.cell_of(p);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) else {
                        continue;
                    };
                    for &b in bucket.iter().filter(|&&b| b > a) {
                        let distance = p.distance(points[b]);
                        if distance < radius {
                            pairs.push(ClosePair { a, b, distance });
                        }
                    }
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(points: &[Point], radius: f64) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for a in 0..points.len() {
            for b in a + 1..points.len() {
                if points[a].distance(points[b]) < radius {
                    pairs.push((a, b));
                }
            }
        }
        pairs
    }

    #[test]
    fn test_matches_brute_force() {
        // Deterministic scatter, including negative coordinates and cell borders.
        let points: Vec<Point> = (0..200)
            .map(|i| {
                let t = i as f64;
                Point::new((t * 37.3) % 400.0 - 200.0, (t * 91.7) % 300.0 - 150.0)
            })
            .collect();
        let mut grid = SpatialGrid::new(25.0);
        grid.rebuild(&points);

        let mut found: Vec<(usize, usize)> =
            grid.close_pairs(&points).iter().map(|p| (p.a, p.b)).collect();
        found.sort_unstable();
        assert_eq!(found, brute_force(&points, 25.0));
    }

    #[test]
    fn test_coincident_points() {
        let points = vec![Point::new(1.0, 1.0), Point::new(1.0, 1.0)];
        let mut grid = SpatialGrid::new(10.0);
        grid.rebuild(&points);
        let pairs = grid.close_pairs(&points);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].distance, 0.0);
    }

    #[test]
    fn test_rebuild_forgets_old_positions() {
        let mut grid = SpatialGrid::new(10.0);
        grid.rebuild(&[Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        let moved = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        grid.rebuild(&moved);
        assert!(grid.close_pairs(&moved).is_empty());
    }
}
