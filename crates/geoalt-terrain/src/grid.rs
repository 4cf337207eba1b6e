//! The geographic sampling lattice.

use crate::geo::BoundingBox;
use crate::planner::GridPlan;

/// Logical `rows x cols` lattice of query points over a bounding box.
///
/// Points are linearly interpolated between the box edges, both endpoints
/// included. Row 0 is the north edge and rows run south; column 0 is the
/// west edge and columns run east. Flat index is `row * cols + col`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleGrid {
    bbox: BoundingBox,
    rows: usize,
    cols: usize,
}

impl SampleGrid {
    /// Create a lattice. Callers are expected to pass at least 2 points per axis.
    pub fn new(bbox: BoundingBox, rows: usize, cols: usize) -> Self {
        Self { bbox, rows, cols }
    }

    /// Lattice for a planned grid.
    pub fn from_plan(bbox: BoundingBox, plan: &GridPlan) -> Self {
        Self::new(bbox, plan.rows, plan.cols)
    }

    /// Bounding box being sampled.
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total point count.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// True if the lattice has no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat row-major index of a cell.
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Latitude of a row.
    pub fn row_lat(&self, row: usize) -> f64 {
        linspace_at(self.bbox.north, self.bbox.south, row, self.rows)
    }

    /// Longitude of a column.
    pub fn col_lon(&self, col: usize) -> f64 {
        linspace_at(self.bbox.west, self.bbox.east, col, self.cols)
    }

    /// All column longitudes, west to east.
    pub fn col_lons(&self) -> Vec<f64> {
        (0..self.cols).map(|col| self.col_lon(col)).collect()
    }

    /// (lon, lat) of a cell.
    pub fn point(&self, row: usize, col: usize) -> (f64, f64) {
        (self.col_lon(col), self.row_lat(row))
    }
}

/// Value `i` of `n` evenly spaced values from `start` to `end` inclusive.
fn linspace_at(start: f64, end: f64, i: usize, n: usize) -> f64 {
    if n < 2 {
        return start;
    }
    if i + 1 == n {
        // Exact endpoint, no accumulated rounding
        return end;
    }
    start + (end - start) * (i as f64 / (n - 1) as f64)
}
