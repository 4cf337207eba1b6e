//! # geoalt-terrain
//!
//! Turns a geographic bounding box into a regular grid of ground elevations
//! and a quad mesh, using a web elevation service as the only data source.
//!
//! ## Overview
//!
//! A run goes through four stages:
//! - **Planning** picks the number of rows and columns from a target ground
//!   spacing (or a fixed step count) and reports the spacing actually realized.
//! - **Fetching** sends one request per grid row to the elevation service and
//!   collects the answers in row-major order. Every request is length-checked
//!   against the transport limit before the first one is sent.
//! - **Projection** converts lon/lat to local metres with an equirectangular
//!   approximation centered on the box (fine for a few kilometres).
//! - **Meshing** turns the grid into vertices and counter-clockwise quad
//!   faces and summarizes the per-point accuracy.
//!
//! The service defaults to the IGN Géoportail altimetry endpoint:
//! `GET elevation.json?lon=a|b|c&lat=y|y|y` answering
//! `{"elevations": [{"lon", "lat", "z", "acc"}, ...]}`.
//!
//! ## Example
//!
//! ```no_run
//! use geoalt_terrain::{
//!     BatchedElevationFetcher, BoundingBox, CollectingSink, HttpElevationService, Resolution,
//!     TerrainRun,
//! };
//!
//! let bbox = BoundingBox::new(42.585322, 42.581024, 8.72734, 8.720999)?;
//! let run = TerrainRun::new(bbox, Resolution::Spacing(20.0));
//!
//! let fetcher = BatchedElevationFetcher::new(HttpElevationService::new()?);
//! let mut sink = CollectingSink::default();
//! let surface = run.run(&fetcher, &mut sink)?;
//! println!(
//!     "{} vertices, mean accuracy {:.2}",
//!     surface.mesh.vertices.len(),
//!     surface.mesh.accuracy.mean
//! );
//! # Ok::<(), geoalt_terrain::TerrainError>(())
//! ```

mod error;
mod fetcher;
mod geo;
mod grid;
mod mesh;
mod pipeline;
mod planner;
mod request;
mod service;
mod surface;

pub use error::TerrainError;
pub use fetcher::{
    parse_row, BatchedElevationFetcher, ElevationSample, FetchOptions, ProgressCallback,
    COORDINATE_TOLERANCE_DEG,
};
pub use geo::{BoundingBox, ProjectionFrame, EARTH_METERS_PER_DEGREE, PRESETS};
pub use grid::SampleGrid;
pub use mesh::{quad_faces, AccuracySummary, GridMeshBuilder, TerrainMesh};
pub use pipeline::{TerrainRun, DEFAULT_SURFACE_NAME};
pub use planner::{plan_grid, GridPlan, Resolution, MAX_AXIS_POINTS, MIN_AXIS_POINTS};
pub use request::ElevationQuery;
pub use service::{
    ElevationService, HttpElevationService, DEFAULT_ENDPOINT, DEFAULT_MAX_REQUEST_LEN,
    DEFAULT_TIMEOUT_SECS,
};
pub use surface::{CollectingSink, MeshSink, PropertyValue, TerrainSurface};

/// Result type for terrain operations.
pub type Result<T> = std::result::Result<T, TerrainError>;
