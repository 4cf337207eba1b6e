//! # geoalt-runner
//!
//! Configuration, output and orchestration for the `geoalt` command.
//!
//! A run is described by a YAML file (see `configs/`) whose values can be
//! overridden from the command line, then handed to `geoalt-terrain` and
//! written out as a Wavefront OBJ plus an optional JSON metadata sidecar.

pub mod config;
pub mod output;
pub mod run;

pub use config::{
    AreaConfig, ConfigOverrides, OutputConfig, ResolutionConfig, RunConfig, ServiceConfig,
};
pub use output::{write_metadata, write_obj, FileSink};
pub use run::{build_terrain, build_terrain_with, plan_run, PlanReport};

use geoalt_terrain::TerrainError;
use thiserror::Error;

/// Errors that can occur while running the tool.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{} failed: {0}", .0.stage())]
    Terrain(#[from] TerrainError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
