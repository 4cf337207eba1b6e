//! Resolution planning: how many grid points to sample on each axis.

use crate::geo::{BoundingBox, ProjectionFrame};
use crate::{Result, TerrainError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Minimum number of points per axis (one quad).
pub const MIN_AXIS_POINTS: usize = 2;

/// Upper bound on points per axis.
pub const MAX_AXIS_POINTS: usize = 100_000;

/// Row count above which the planner warns about the number of requests.
const MANY_REQUESTS_WARNING: usize = 500;

/// How the grid resolution is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Target ground distance between adjacent points, in metres.
    Spacing(f64),
    /// Fixed number of points on both axes.
    Steps(usize),
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::Spacing(20.0)
    }
}

/// Grid dimensions chosen for a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPlan {
    /// Points along the north-south axis (one request each).
    pub rows: usize,
    /// Points along the west-east axis.
    pub cols: usize,
    /// Projected west-east extent in metres.
    pub width: f64,
    /// Projected north-south extent in metres.
    pub height: f64,
    /// Realized distance between adjacent columns, in metres.
    ///
    /// This is `width / (cols - 1)`, not `width / cols`: both edges are
    /// sampled, so `cols` points span `cols - 1` intervals.
    pub spacing_x: f64,
    /// Realized distance between adjacent rows, in metres: `height / (rows - 1)`.
    pub spacing_y: f64,
}

impl GridPlan {
    /// Total number of sample points.
    pub fn point_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Number of quads the mesh will have.
    pub fn face_count(&self) -> usize {
        (self.rows - 1) * (self.cols - 1)
    }
}

/// Choose grid dimensions for `bbox`.
///
/// Each axis is derived from its own extent: columns from the projected
/// width, rows from the projected height. Both are clamped to at least
/// [`MIN_AXIS_POINTS`], so a spacing larger than the box yields a single
/// quad instead of an error.
pub fn plan_grid(bbox: &BoundingBox, resolution: Resolution) -> Result<GridPlan> {
    bbox.validate()?;
    let frame = ProjectionFrame::from_bbox(bbox);

    let width = frame.to_local_x(bbox.east) - frame.to_local_x(bbox.west);
    let height = frame.to_local_y(bbox.north) - frame.to_local_y(bbox.south);

    let (rows, cols) = match resolution {
        Resolution::Spacing(spacing) => {
            if !spacing.is_finite() || spacing <= 0.0 {
                return Err(TerrainError::InvalidResolution(format!(
                    "spacing must be a positive number of metres, got {}",
                    spacing
                )));
            }
            (
                axis_points(height, spacing, "rows")?,
                axis_points(width, spacing, "cols")?,
            )
        }
        Resolution::Steps(steps) => {
            if !(MIN_AXIS_POINTS..=MAX_AXIS_POINTS).contains(&steps) {
                return Err(TerrainError::InvalidResolution(format!(
                    "step count must be within {}..={}, got {}",
                    MIN_AXIS_POINTS, MAX_AXIS_POINTS, steps
                )));
            }
            (steps, steps)
        }
    };

    let plan = GridPlan {
        rows,
        cols,
        width,
        height,
        spacing_x: width / (cols - 1) as f64,
        spacing_y: height / (rows - 1) as f64,
    };

    info!(
        "Planned {}x{} grid over {:.1}m x {:.1}m (spacing {:.2}m x {:.2}m)",
        plan.rows, plan.cols, width, height, plan.spacing_x, plan.spacing_y
    );
    if plan.rows > MANY_REQUESTS_WARNING {
        warn!("Grid needs {} elevation requests, one per row", plan.rows);
    }

    Ok(plan)
}

/// Points along one axis for the given extent.
fn axis_points(extent: f64, spacing: f64, axis: &str) -> Result<usize> {
    let steps = (extent / spacing).round();
    if steps > MAX_AXIS_POINTS as f64 {
        return Err(TerrainError::InvalidResolution(format!(
            "spacing {}m needs {} {}, more than {}",
            spacing, steps, axis, MAX_AXIS_POINTS
        )));
    }
    Ok((steps as usize).max(MIN_AXIS_POINTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn revellata() -> BoundingBox {
        BoundingBox::preset("la-revellata").unwrap()
    }

    #[test]
    fn test_revellata_100m_is_reproducible() {
        let first = plan_grid(&revellata(), Resolution::Spacing(100.0)).unwrap();
        let second = plan_grid(&revellata(), Resolution::Spacing(100.0)).unwrap();
        assert_eq!(first, second);
        // ~519m wide, ~478m tall
        assert_eq!((first.rows, first.cols), (5, 5));
    }

    #[test]
    fn test_rows_and_cols_use_their_own_axis() {
        // 20m spacing separates the axes: ~25.9 columns vs ~23.9 rows
        let plan = plan_grid(&revellata(), Resolution::Spacing(20.0)).unwrap();
        assert_eq!(plan.cols, 26);
        assert_eq!(plan.rows, 24);

        // A box four times wider than tall must not reuse the width for rows
        let wide = BoundingBox::new(42.001, 42.0, 8.0 + 0.004 / 0.743, 8.0).unwrap();
        let plan = plan_grid(&wide, Resolution::Spacing(10.0)).unwrap();
        assert!(plan.cols > 3 * plan.rows, "cols={} rows={}", plan.cols, plan.rows);
        assert_relative_eq!(plan.height, 111.12, epsilon = 1e-6);
        assert_eq!(plan.rows, 11);
    }

    #[test]
    fn test_spacing_larger_than_box_collapses_to_one_quad() {
        let plan = plan_grid(&revellata(), Resolution::Spacing(10_000.0)).unwrap();
        assert_eq!((plan.rows, plan.cols), (2, 2));
        assert_eq!(plan.face_count(), 1);
        assert_relative_eq!(plan.spacing_x, plan.width);
        assert_relative_eq!(plan.spacing_y, plan.height);
    }

    #[test]
    fn test_minimum_holds_for_many_boxes() {
        let boxes = [
            BoundingBox::new(0.0001, 0.0, 0.0001, 0.0).unwrap(),
            BoundingBox::new(60.5, 60.0, 10.001, 10.0).unwrap(),
            BoundingBox::new(-33.0, -33.01, 151.3, 151.2).unwrap(),
            revellata(),
        ];
        for bbox in boxes {
            for spacing in [1.0, 25.0, 100.0, 1e6] {
                let plan = plan_grid(&bbox, Resolution::Spacing(spacing)).unwrap();
                assert!(plan.rows >= 2 && plan.cols >= 2, "{:?} at {}m", bbox, spacing);
            }
        }
    }

    #[test]
    fn test_fixed_steps() {
        let plan = plan_grid(&revellata(), Resolution::Steps(125)).unwrap();
        assert_eq!((plan.rows, plan.cols), (125, 125));
        assert_eq!(plan.point_count(), 125 * 125);
        assert_relative_eq!(plan.spacing_x * 124.0, plan.width, epsilon = 1e-9);

        assert!(plan_grid(&revellata(), Resolution::Steps(1)).is_err());
    }

    #[test]
    fn test_invalid_spacing() {
        for spacing in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = plan_grid(&revellata(), Resolution::Spacing(spacing)).unwrap_err();
            assert!(matches!(err, TerrainError::InvalidResolution(_)));
        }
        let err = plan_grid(&revellata(), Resolution::Spacing(1e-6)).unwrap_err();
        assert_eq!(err.stage(), "planning");
    }

    #[test]
    fn test_invalid_box_is_rejected() {
        let bbox = BoundingBox {
            north: 42.0,
            south: 43.0,
            east: 9.0,
            west: 8.0,
        };
        let err = plan_grid(&bbox, Resolution::Spacing(10.0)).unwrap_err();
        assert!(matches!(err, TerrainError::InvalidBoundingBox { .. }));
    }
}
