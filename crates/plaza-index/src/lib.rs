//! Spatial helpers and neighbourhood indices for avatar proximity queries.

pub mod geometry;

pub use geometry::{Rect, distance, point_in_rect, rects_overlap};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors emitted by spatial index implementations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Indicates configuration values that cannot be used (e.g., non-positive cell size).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Common behaviour exposed by neighbourhood indices.
///
/// Implementations must report matches in ascending input index order so that
/// callers observe the same ordering regardless of the backing structure.
pub trait NeighborhoodIndex {
    /// Rebuild internal structures from the provided positions.
    fn rebuild(&mut self, positions: &[(f32, f32)]) -> Result<(), IndexError>;

    /// Visit every indexed point whose distance to `origin` is `<= radius`.
    fn neighbors_within(
        &self,
        origin: (f32, f32),
        radius: f32,
        visitor: &mut dyn FnMut(usize, OrderedFloat<f32>),
    );

    /// Number of points currently indexed.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Brute-force scan over every indexed point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearScanIndex {
    #[serde(skip)]
    positions: Vec<(f32, f32)>,
}

impl LinearScanIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl NeighborhoodIndex for LinearScanIndex {
    fn rebuild(&mut self, positions: &[(f32, f32)]) -> Result<(), IndexError> {
        self.positions.clear();
        self.positions.extend_from_slice(positions);
        Ok(())
    }

    fn neighbors_within(
        &self,
        origin: (f32, f32),
        radius: f32,
        visitor: &mut dyn FnMut(usize, OrderedFloat<f32>),
    ) {
        for (idx, &point) in self.positions.iter().enumerate() {
            let dist = distance(origin, point);
            if dist <= radius {
                visitor(idx, OrderedFloat(dist));
            }
        }
    }

    fn len(&self) -> usize {
        self.positions.len()
    }
}

/// Uniform grid index bucketing points into square cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniformGridIndex {
    /// Edge length of each grid cell used for bucketing points.
    pub cell_size: f32,
    #[serde(skip)]
    positions: Vec<(f32, f32)>,
    #[serde(skip)]
    buckets: HashMap<(i32, i32), Vec<usize>>,
    #[serde(skip)]
    occupied: Option<((i32, i32), (i32, i32))>,
}

impl UniformGridIndex {
    /// Create a new uniform grid with the provided cell size.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            positions: Vec::new(),
            buckets: HashMap::new(),
            occupied: None,
        }
    }

    /// Create a grid, rejecting cell sizes that cannot bucket anything.
    pub fn try_new(cell_size: f32) -> Result<Self, IndexError> {
        Self::check_cell_size(cell_size)?;
        Ok(Self::new(cell_size))
    }

    fn check_cell_size(cell_size: f32) -> Result<(), IndexError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(IndexError::InvalidConfig("cell_size must be positive"));
        }
        Ok(())
    }

    fn cell_of(&self, point: (f32, f32)) -> (i32, i32) {
        (
            (point.0 / self.cell_size).floor() as i32,
            (point.1 / self.cell_size).floor() as i32,
        )
    }
}

impl Default for UniformGridIndex {
    fn default() -> Self {
        Self::new(120.0)
    }
}

impl NeighborhoodIndex for UniformGridIndex {
    fn rebuild(&mut self, positions: &[(f32, f32)]) -> Result<(), IndexError> {
        Self::check_cell_size(self.cell_size)?;
        self.positions.clear();
        self.positions.extend_from_slice(positions);
        self.buckets.clear();
        self.occupied = None;

        for (idx, &point) in positions.iter().enumerate() {
            let cell = self.cell_of(point);
            self.buckets.entry(cell).or_default().push(idx);
            self.occupied = Some(match self.occupied {
                None => (cell, cell),
                Some((lo, hi)) => (
                    (lo.0.min(cell.0), lo.1.min(cell.1)),
                    (hi.0.max(cell.0), hi.1.max(cell.1)),
                ),
            });
        }
        Ok(())
    }

    fn neighbors_within(
        &self,
        origin: (f32, f32),
        radius: f32,
        visitor: &mut dyn FnMut(usize, OrderedFloat<f32>),
    ) {
        let Some((occupied_lo, occupied_hi)) = self.occupied else {
            return;
        };
        if radius.is_nan() || radius < 0.0 {
            return;
        }

        let lo = self.cell_of((origin.0 - radius, origin.1 - radius));
        let hi = self.cell_of((origin.0 + radius, origin.1 + radius));
        // One cell of slack absorbs rounding at the query box edges.
        let x0 = lo.0.saturating_sub(1).max(occupied_lo.0);
        let y0 = lo.1.saturating_sub(1).max(occupied_lo.1);
        let x1 = hi.0.saturating_add(1).min(occupied_hi.0);
        let y1 = hi.1.saturating_add(1).min(occupied_hi.1);

        let mut candidates = Vec::new();
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                if let Some(bucket) = self.buckets.get(&(cx, cy)) {
                    candidates.extend_from_slice(bucket);
                }
            }
        }
        candidates.sort_unstable();

        for idx in candidates {
            let dist = distance(origin, self.positions[idx]);
            if dist <= radius {
                visitor(idx, OrderedFloat(dist));
            }
        }
    }

    fn len(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(index: &dyn NeighborhoodIndex, origin: (f32, f32), radius: f32) -> Vec<usize> {
        let mut hits = Vec::new();
        index.neighbors_within(origin, radius, &mut |idx, _| hits.push(idx));
        hits
    }

    fn sample_positions() -> Vec<(f32, f32)> {
        vec![
            (450.0, 320.0),
            (200.0, 200.0),
            (436.0, 348.0),
            (1000.0, 700.0),
            (400.0, 300.0),
            (-35.0, -10.0),
        ]
    }

    #[test]
    fn linear_scan_reports_input_order_and_inclusive_radius() {
        let mut index = LinearScanIndex::new();
        index.rebuild(&sample_positions()).expect("rebuild");
        assert_eq!(index.len(), 6);
        assert_eq!(collect(&index, (400.0, 300.0), 60.0), vec![0, 2, 4]);
        assert_eq!(collect(&index, (400.0, 300.0), 59.99), vec![0, 4]);
    }

    #[test]
    fn grid_rejects_non_positive_cell_size() {
        assert!(UniformGridIndex::try_new(0.0).is_err());
        assert!(UniformGridIndex::try_new(f32::NAN).is_err());
        let mut grid = UniformGridIndex::new(-5.0);
        let err = grid.rebuild(&sample_positions()).expect_err("invalid grid");
        assert!(matches!(err, IndexError::InvalidConfig(_)));
    }

    #[test]
    fn grid_matches_linear_scan() {
        let positions = sample_positions();
        let mut linear = LinearScanIndex::new();
        linear.rebuild(&positions).expect("linear");
        let mut grid = UniformGridIndex::try_new(32.0).expect("grid");
        grid.rebuild(&positions).expect("rebuild grid");

        for &(origin, radius) in &[
            ((400.0, 300.0), 60.0),
            ((0.0, 0.0), 40.0),
            ((0.0, 0.0), 5_000.0),
            ((1000.0, 700.0), 0.0),
        ] {
            assert_eq!(
                collect(&grid, origin, radius),
                collect(&linear, origin, radius),
                "mismatch at origin {origin:?} radius {radius}"
            );
        }
    }

    #[test]
    fn empty_grid_visits_nothing() {
        let grid = UniformGridIndex::default();
        assert!(grid.is_empty());
        assert!(collect(&grid, (0.0, 0.0), 100.0).is_empty());
    }

    #[test]
    fn visitor_receives_distances() {
        let mut index = LinearScanIndex::new();
        index
            .rebuild(&[(3.0, 4.0), (6.0, 8.0)])
            .expect("rebuild");
        let mut seen = Vec::new();
        index.neighbors_within((0.0, 0.0), 10.0, &mut |idx, dist| seen.push((idx, dist)));
        assert_eq!(seen, vec![(0, OrderedFloat(5.0)), (1, OrderedFloat(10.0))]);
    }
}
