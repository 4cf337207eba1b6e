//! Row-batched elevation fetching.
//!
//! One request is issued per grid row. Every row's request is serialized and
//! length-checked before anything goes on the network, so an oversized grid
//! fails up front instead of partway through a run.
//!
//! Rows are fetched strictly in order by default. With a concurrency above 1
//! the rows are spread over a bounded worker pool and reassembled by row
//! index, so the output is row-major either way.
//!
//! A row that is longer than the transport limit is not subdivided; the
//! fetch fails with [`TerrainError::RequestTooLong`].

use crate::grid::SampleGrid;
use crate::request::ElevationQuery;
use crate::service::{ElevationService, DEFAULT_MAX_REQUEST_LEN};
use crate::{Result, TerrainError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// One point returned by the elevation service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationSample {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
    /// Elevation in metres.
    #[serde(rename = "z")]
    pub elevation: f64,
    /// Accuracy reported by the service for this point.
    #[serde(rename = "acc")]
    pub accuracy: f64,
}

/// Largest lon/lat difference, in degrees, between a requested point and the
/// point echoed back. The service rounds coordinates in its answer.
pub const COORDINATE_TOLERANCE_DEG: f64 = 1e-6;

/// Response body of the elevation service.
#[derive(Debug, Deserialize)]
struct ElevationResponse {
    elevations: Vec<ElevationSample>,
}

/// Callback for fetch progress, called with (rows done, total rows).
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Fetch tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum serialized request length in bytes.
    pub max_request_len: usize,
    /// Maximum requests in flight. 1 fetches rows sequentially.
    pub concurrency: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_request_len: DEFAULT_MAX_REQUEST_LEN,
            concurrency: 1,
        }
    }
}

/// Fetches a [`SampleGrid`] from an [`ElevationService`], one request per row.
pub struct BatchedElevationFetcher<S> {
    /// Service answering the queries.
    service: S,
    /// Fetch tuning.
    options: FetchOptions,
    /// Set from outside to stop issuing new requests.
    cancel: Arc<AtomicBool>,
    /// Optional progress reporting.
    progress: Option<ProgressCallback>,
}

impl<S> std::fmt::Debug for BatchedElevationFetcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchedElevationFetcher")
            .field("options", &self.options)
            .field("cancelled", &self.cancel.load(Ordering::Relaxed))
            .finish()
    }
}

impl<S: ElevationService> BatchedElevationFetcher<S> {
    /// Create a fetcher with default options.
    pub fn new(service: S) -> Self {
        Self::with_options(service, FetchOptions::default())
    }

    /// Create a fetcher with explicit options.
    pub fn with_options(service: S, options: FetchOptions) -> Self {
        Self {
            service,
            options,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: None,
        }
    }

    /// Share a cancellation flag. Setting it stops new requests from being issued.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Report progress after each row.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Fetch options in use.
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Build and length-check every row's request URL without sending anything.
    pub fn plan_requests(&self, grid: &SampleGrid) -> Result<Vec<String>> {
        if grid.rows() < 2 || grid.cols() < 2 {
            return Err(TerrainError::EmptyGrid {
                rows: grid.rows(),
                cols: grid.cols(),
            });
        }

        (0..grid.rows())
            .map(|row| {
                ElevationQuery::for_row(grid, row)
                    .to_checked_url(self.service.endpoint(), self.options.max_request_len)
            })
            .collect()
    }

    /// Fetch every point of `grid` in row-major order.
    ///
    /// On any failure the whole fetch fails; no partial grid is returned.
    pub fn fetch(&self, grid: &SampleGrid) -> Result<Vec<ElevationSample>> {
        let urls = self.plan_requests(grid)?;
        let started = Instant::now();
        let completed = AtomicUsize::new(0);

        let samples = if self.options.concurrency <= 1 {
            self.fetch_sequential(grid, &urls, &completed)?
        } else {
            self.fetch_concurrent(grid, &urls, &completed)?
        };

        info!(
            "Fetched {} elevations in {} requests ({:.2}s)",
            samples.len(),
            urls.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(samples)
    }

    fn fetch_sequential(
        &self,
        grid: &SampleGrid,
        urls: &[String],
        completed: &AtomicUsize,
    ) -> Result<Vec<ElevationSample>> {
        let mut samples = Vec::with_capacity(grid.len());
        for (row, url) in urls.iter().enumerate() {
            samples.extend(self.fetch_row(grid, row, url, completed)?);
        }
        Ok(samples)
    }

    fn fetch_concurrent(
        &self,
        grid: &SampleGrid,
        urls: &[String],
        completed: &AtomicUsize,
    ) -> Result<Vec<ElevationSample>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.concurrency)
            .thread_name(|i| format!("elevation-fetch-{}", i))
            .build()?;

        // Raised by the first failing row so no further rows are issued
        let abort = AtomicBool::new(false);

        let results: Vec<Result<Option<Vec<ElevationSample>>>> = pool.install(|| {
            urls.par_iter()
                .enumerate()
                .map(|(row, url)| {
                    if abort.load(Ordering::Relaxed) {
                        return Ok(None);
                    }
                    match self.fetch_row(grid, row, url, completed) {
                        Ok(samples) => Ok(Some(samples)),
                        Err(e) => {
                            abort.store(true, Ordering::Relaxed);
                            Err(e)
                        }
                    }
                })
                .collect()
        });

        // Report the lowest failing row
        let mut rows = Vec::with_capacity(results.len());
        for result in results {
            rows.push(result?);
        }

        let mut samples = Vec::with_capacity(grid.len());
        for (row, fetched) in rows.into_iter().enumerate() {
            samples.extend(fetched.ok_or(TerrainError::Cancelled { row })?);
        }
        Ok(samples)
    }

    fn fetch_row(
        &self,
        grid: &SampleGrid,
        row: usize,
        url: &str,
        completed: &AtomicUsize,
    ) -> Result<Vec<ElevationSample>> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(TerrainError::Cancelled { row });
        }

        debug!("Requesting row {} ({} bytes)", row, url.len());
        let body = self.service.get(row, url)?;
        let samples = parse_row(&ElevationQuery::for_row(grid, row), &body)?;

        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(progress) = &self.progress {
            progress(done, grid.rows());
        }

        Ok(samples)
    }
}

/// Parse one row's response body.
///
/// The answer must list exactly the queried points, in query order. Any
/// other point count or a point away from its requested position is a
/// [`TerrainError::MalformedResponse`].
pub fn parse_row(query: &ElevationQuery, body: &str) -> Result<Vec<ElevationSample>> {
    let row = query.row();
    let response: ElevationResponse =
        serde_json::from_str(body).map_err(|e| TerrainError::MalformedResponse {
            row,
            reason: format!("{} (body starts with {:?})", e, preview(body)),
        })?;

    if response.elevations.len() != query.len() {
        return Err(TerrainError::MalformedResponse {
            row,
            reason: format!(
                "expected {} elevations, got {}",
                query.len(),
                response.elevations.len()
            ),
        });
    }

    let requested = query.lons().iter().zip(query.lats());
    for (col, (sample, (&lon, &lat))) in response.elevations.iter().zip(requested).enumerate() {
        if (sample.lon - lon).abs() > COORDINATE_TOLERANCE_DEG
            || (sample.lat - lat).abs() > COORDINATE_TOLERANCE_DEG
        {
            return Err(TerrainError::MalformedResponse {
                row,
                reason: format!(
                    "point {} is ({}, {}), requested ({}, {})",
                    col, sample.lon, sample.lat, lon, lat
                ),
            });
        }
    }

    Ok(response.elevations)
}

/// First few characters of a body for error messages.
fn preview(body: &str) -> String {
    body.chars().take(60).collect()
}
