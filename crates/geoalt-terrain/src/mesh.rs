//! Quad mesh construction over the sampled grid.

use crate::fetcher::ElevationSample;
use crate::geo::ProjectionFrame;
use crate::{Result, TerrainError};
use serde::Serialize;

/// Min, max and mean of the per-point accuracy values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracySummary {
    /// Best (smallest) accuracy value.
    pub min: f64,
    /// Worst (largest) accuracy value.
    pub max: f64,
    /// Mean accuracy value.
    pub mean: f64,
}

impl AccuracySummary {
    /// Summarize a set of accuracy values.
    ///
    /// An empty set has no summary and yields [`TerrainError::EmptyGrid`].
    pub fn from_values(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(TerrainError::EmptyGrid { rows: 0, cols: 0 });
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &value in values {
            min = min.min(value);
            max = max.max(value);
            sum += value;
        }

        Ok(Self {
            min,
            max,
            mean: sum / values.len() as f64,
        })
    }
}

/// Vertices and quad faces of a terrain surface.
///
/// Vertex `k` is the sample at flat grid index `k = row * cols + col`.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    /// Local (x, y, z) in metres.
    pub vertices: Vec<[f64; 3]>,
    /// Four vertex indices per grid cell.
    pub faces: Vec<[usize; 4]>,
    /// Accuracy over all samples.
    pub accuracy: AccuracySummary,
    /// Grid rows.
    pub rows: usize,
    /// Grid columns.
    pub cols: usize,
}

impl TerrainMesh {
    /// Elevation of the north-west corner.
    pub fn nw_elevation(&self) -> f64 {
        self.vertices[0][2]
    }

    /// Lowest and highest vertex elevation.
    pub fn elevation_range(&self) -> (f64, f64) {
        self.vertices
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v[2]), hi.max(v[2]))
            })
    }
}

/// Builds a [`TerrainMesh`] from row-major elevation samples.
#[derive(Debug, Clone, Copy)]
pub struct GridMeshBuilder {
    frame: ProjectionFrame,
    rows: usize,
    cols: usize,
}

impl GridMeshBuilder {
    /// Builder for a `rows x cols` grid projected through `frame`.
    pub fn new(frame: ProjectionFrame, rows: usize, cols: usize) -> Self {
        Self { frame, rows, cols }
    }

    /// Project every sample and connect the grid cells.
    pub fn build(&self, samples: &[ElevationSample]) -> Result<TerrainMesh> {
        if self.rows < 2 || self.cols < 2 {
            return Err(TerrainError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        let expected = self.rows * self.cols;
        if samples.len() != expected {
            return Err(TerrainError::SampleCountMismatch {
                expected,
                actual: samples.len(),
            });
        }

        let vertices = samples
            .iter()
            .map(|s| {
                let (x, y) = self.frame.to_local(s.lon, s.lat);
                [x, y, s.elevation]
            })
            .collect();

        let accuracy: Vec<f64> = samples.iter().map(|s| s.accuracy).collect();

        Ok(TerrainMesh {
            vertices,
            faces: quad_faces(self.rows, self.cols),
            accuracy: AccuracySummary::from_values(&accuracy)?,
            rows: self.rows,
            cols: self.cols,
        })
    }
}

/// Quad faces for a `rows x cols` row-major grid.
///
/// Each face holds the cell's top-left, bottom-left, bottom-right and
/// top-right corners. Rows run south, so this order is counter-clockwise
/// seen from above and the face normal points up (+Z).
pub fn quad_faces(rows: usize, cols: usize) -> Vec<[usize; 4]> {
    if rows < 2 || cols < 2 {
        return Vec::new();
    }

    let mut faces = Vec::with_capacity((rows - 1) * (cols - 1));
    for row in 0..rows - 1 {
        for col in 0..cols - 1 {
            let top_left = row * cols + col;
            let top_right = top_left + 1;
            let bottom_left = (row + 1) * cols + col;
            let bottom_right = bottom_left + 1;
            faces.push([top_left, bottom_left, bottom_right, top_right]);
        }
    }
    faces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::BoundingBox;
    use crate::grid::SampleGrid;
    use approx::assert_relative_eq;

    fn synthetic(grid: &SampleGrid) -> Vec<ElevationSample> {
        let mut samples = Vec::with_capacity(grid.len());
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let (lon, lat) = grid.point(row, col);
                samples.push(ElevationSample {
                    lon,
                    lat,
                    elevation: (row * 10 + col) as f64,
                    accuracy: 1.0 + col as f64,
                });
            }
        }
        samples
    }

    fn setup(rows: usize, cols: usize) -> (GridMeshBuilder, Vec<ElevationSample>) {
        let bbox = BoundingBox::preset("la-revellata").unwrap();
        let grid = SampleGrid::new(bbox, rows, cols);
        let frame = ProjectionFrame::from_bbox(&bbox);
        (GridMeshBuilder::new(frame, rows, cols), synthetic(&grid))
    }

    /// Signed area of a face projected on XY (positive when counter-clockwise).
    fn signed_area(mesh: &TerrainMesh, face: &[usize; 4]) -> f64 {
        let mut area = 0.0;
        for i in 0..4 {
            let a = mesh.vertices[face[i]];
            let b = mesh.vertices[face[(i + 1) % 4]];
            area += a[0] * b[1] - b[0] * a[1];
        }
        area / 2.0
    }

    #[test]
    fn test_accuracy_summary() {
        let summary = AccuracySummary::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 4.0);
        assert_relative_eq!(summary.mean, 2.5);
    }

    #[test]
    fn test_accuracy_summary_empty_is_an_error() {
        assert!(matches!(
            AccuracySummary::from_values(&[]),
            Err(TerrainError::EmptyGrid { .. })
        ));
    }

    #[test]
    fn test_counts_and_index_bounds() {
        for (rows, cols) in [(2, 2), (3, 7), (10, 4)] {
            let (builder, samples) = setup(rows, cols);
            let mesh = builder.build(&samples).unwrap();
            assert_eq!(mesh.vertices.len(), rows * cols);
            assert_eq!(mesh.faces.len(), (rows - 1) * (cols - 1));
            for face in &mesh.faces {
                assert!(face.iter().all(|&i| i < rows * cols), "{:?}", face);
            }
        }
    }

    #[test]
    fn test_minimum_grid_has_one_upward_face() {
        let (builder, samples) = setup(2, 2);
        let mesh = builder.build(&samples).unwrap();
        assert_eq!(mesh.faces, vec![[0, 2, 3, 1]]);

        let mut indices = mesh.faces[0].to_vec();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3]);

        assert!(signed_area(&mesh, &mesh.faces[0]) > 0.0);
    }

    #[test]
    fn test_every_face_is_counter_clockwise() {
        let (builder, samples) = setup(5, 6);
        let mesh = builder.build(&samples).unwrap();
        for face in &mesh.faces {
            assert!(signed_area(&mesh, face) > 0.0, "face {:?} is clockwise", face);
        }
    }

    #[test]
    fn test_vertices_keep_sample_index() {
        let (builder, samples) = setup(3, 4);
        let mesh = builder.build(&samples).unwrap();
        // elevation encodes row * 10 + col
        assert_eq!(mesh.vertices[4 + 2][2], 12.0);
        assert_eq!(mesh.nw_elevation(), 0.0);
        assert_eq!(mesh.elevation_range(), (0.0, 23.0));
        // north-west corner is up and left of the origin
        assert!(mesh.vertices[0][0] < 0.0 && mesh.vertices[0][1] > 0.0);
        assert_eq!(mesh.accuracy.min, 1.0);
        assert_eq!(mesh.accuracy.max, 4.0);
        assert_relative_eq!(mesh.accuracy.mean, 2.5);
    }

    #[test]
    fn test_degenerate_and_mismatched_input() {
        let (builder, samples) = setup(3, 3);
        assert!(matches!(
            builder.build(&samples[..8]),
            Err(TerrainError::SampleCountMismatch { expected: 9, actual: 8 })
        ));

        let frame = ProjectionFrame::from_bbox(&BoundingBox::preset("oloron").unwrap());
        assert!(matches!(
            GridMeshBuilder::new(frame, 1, 3).build(&[]),
            Err(TerrainError::EmptyGrid { rows: 1, cols: 3 })
        ));
        assert!(quad_faces(0, 5).is_empty());
    }
}
