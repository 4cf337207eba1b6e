//! Driving a configured run: plan, fetch, mesh, write.

use crate::config::RunConfig;
use crate::output::FileSink;
use crate::RunnerError;
use geoalt_terrain::{
    BatchedElevationFetcher, ElevationQuery, ElevationService, GridPlan, HttpElevationService,
    MeshSink, SampleGrid, TerrainSurface,
};
use serde::Serialize;
use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// What a run would do, computed without touching the network.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    /// Grid dimensions and realized spacing.
    pub plan: GridPlan,
    /// Number of requests (one per row).
    pub requests: usize,
    /// Longest row request in bytes.
    pub longest_request: usize,
    /// Configured limit in bytes.
    pub max_request_len: usize,
}

impl PlanReport {
    /// True if every row request fits within the limit.
    pub fn fits(&self) -> bool {
        self.longest_request <= self.max_request_len
    }

    /// Pretty JSON form of the report.
    pub fn to_json(&self) -> Result<String, RunnerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Plan a run and measure its requests.
pub fn plan_run(config: &RunConfig) -> Result<PlanReport, RunnerError> {
    let run = config.terrain_run()?;
    let plan = run.plan()?;
    let grid = SampleGrid::from_plan(run.bbox, &plan);

    let longest_request = (0..grid.rows())
        .map(|row| ElevationQuery::for_row(&grid, row).to_url(&config.service.endpoint).len())
        .max()
        .unwrap_or(0);

    Ok(PlanReport {
        plan,
        requests: grid.rows(),
        longest_request,
        max_request_len: config.service.max_request_len,
    })
}

/// Run against the configured HTTP service and write the configured files.
pub fn build_terrain(
    config: &RunConfig,
    cancel: Arc<AtomicBool>,
    show_progress: bool,
) -> Result<TerrainSurface, RunnerError> {
    let service = HttpElevationService::with_endpoint(
        config.service.endpoint.clone(),
        Duration::from_secs(config.service.timeout_secs),
    )?;
    let mut sink = FileSink::new(&config.output.path, config.output.metadata_path.clone());
    build_terrain_with(config, service, &mut sink, cancel, show_progress)
}

/// Run against any elevation service and sink.
pub fn build_terrain_with<S: ElevationService, K: MeshSink + ?Sized>(
    config: &RunConfig,
    service: S,
    sink: &mut K,
    cancel: Arc<AtomicBool>,
    show_progress: bool,
) -> Result<TerrainSurface, RunnerError> {
    let start = Instant::now();
    let run = config.terrain_run()?;

    let mut fetcher = BatchedElevationFetcher::with_options(service, config.fetch_options())
        .with_cancel_flag(cancel);
    if show_progress {
        fetcher = fetcher.with_progress(Box::new(|done, total| {
            eprint!("\r  {}/{}", done, total);
            if done == total {
                eprintln!();
            }
            let _ = std::io::stderr().flush();
        }));
    }

    let surface = run.run(&fetcher, sink)?;

    info!("Done in {:.2} sec", start.elapsed().as_secs_f64());
    Ok(surface)
}
