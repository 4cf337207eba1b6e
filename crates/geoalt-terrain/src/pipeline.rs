//! One terrain run, end to end.
//!
//! A run is a pure batch transform: bounding box and resolution in, complete
//! surface out. Nothing is handed to the sink unless every stage succeeded.

use crate::fetcher::BatchedElevationFetcher;
use crate::geo::{BoundingBox, ProjectionFrame};
use crate::grid::SampleGrid;
use crate::mesh::GridMeshBuilder;
use crate::planner::{plan_grid, GridPlan, Resolution};
use crate::service::ElevationService;
use crate::surface::{MeshSink, TerrainSurface};
use crate::Result;
use std::time::Instant;
use tracing::info;

/// Default object name.
pub const DEFAULT_SURFACE_NAME: &str = "land";

/// Immutable parameters of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainRun {
    /// Area to sample.
    pub bbox: BoundingBox,
    /// How densely to sample it.
    pub resolution: Resolution,
    /// Name given to the created surface.
    pub name: String,
    /// Mark the surface for smooth shading.
    pub smooth: bool,
}

impl TerrainRun {
    /// Run over `bbox` with default name and shading.
    pub fn new(bbox: BoundingBox, resolution: Resolution) -> Self {
        Self {
            bbox,
            resolution,
            name: DEFAULT_SURFACE_NAME.to_string(),
            smooth: true,
        }
    }

    /// Grid dimensions this run will use.
    pub fn plan(&self) -> Result<GridPlan> {
        plan_grid(&self.bbox, self.resolution)
    }

    /// Plan, fetch and mesh the area.
    pub fn build<S: ElevationService>(
        &self,
        fetcher: &BatchedElevationFetcher<S>,
    ) -> Result<TerrainSurface> {
        let started = Instant::now();

        let plan = self.plan()?;
        let frame = ProjectionFrame::from_bbox(&self.bbox);
        let grid = SampleGrid::from_plan(self.bbox, &plan);

        info!(
            "Retrieving {} elevations ({} rows x {} cols)",
            grid.len(),
            plan.rows,
            plan.cols
        );
        let samples = fetcher.fetch(&grid)?;
        let mesh = GridMeshBuilder::new(frame, plan.rows, plan.cols).build(&samples)?;

        info!(
            "Built {} vertices and {} faces in {:.2}s (accuracy min {:.2}, max {:.2}, mean {:.2})",
            mesh.vertices.len(),
            mesh.faces.len(),
            started.elapsed().as_secs_f64(),
            mesh.accuracy.min,
            mesh.accuracy.max,
            mesh.accuracy.mean
        );

        Ok(TerrainSurface {
            name: self.name.clone(),
            smooth: self.smooth,
            bbox: self.bbox,
            frame,
            plan,
            mesh,
        })
    }

    /// Build the surface and hand it to `sink`.
    pub fn run<S: ElevationService, K: MeshSink + ?Sized>(
        &self,
        fetcher: &BatchedElevationFetcher<S>,
        sink: &mut K,
    ) -> Result<TerrainSurface> {
        let surface = self.build(fetcher)?;
        sink.emit(&surface)?;
        Ok(surface)
    }
}
