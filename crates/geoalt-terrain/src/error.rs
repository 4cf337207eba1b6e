//! Error types for the terrain crate.

use thiserror::Error;

/// Errors that can occur while sampling terrain and building the mesh.
///
/// Every error is fatal to a run. Nothing is retried and no partial grid is
/// ever returned alongside an error.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// Bounding box has a non-positive extent or non-finite corners.
    #[error("Invalid bounding box (north={north}, south={south}, east={east}, west={west}): {reason}")]
    InvalidBoundingBox {
        /// North edge latitude.
        north: f64,
        /// South edge latitude.
        south: f64,
        /// East edge longitude.
        east: f64,
        /// West edge longitude.
        west: f64,
        /// What is wrong with it.
        reason: String,
    },

    /// Sampling spacing or step count cannot produce a grid.
    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    /// A row request would exceed the service's accepted URI length.
    #[error("Transport error on row {row}: request is {length} bytes, limit is {limit}")]
    RequestTooLong {
        /// Row whose request is too long.
        row: usize,
        /// Serialized request length in bytes.
        length: usize,
        /// Configured transport limit in bytes.
        limit: usize,
    },

    /// The network call for a row failed.
    #[error("Transport error on row {row}: {reason}")]
    Transport {
        /// Row being fetched.
        row: usize,
        /// Reason for failure.
        reason: String,
    },

    /// The response body for a row did not match the expected schema.
    #[error("Malformed response on row {row}: {reason}")]
    MalformedResponse {
        /// Row being fetched.
        row: usize,
        /// Reason for failure.
        reason: String,
    },

    /// Mesh construction was asked to work on fewer than 2 rows or columns.
    #[error("Empty grid: {rows} rows x {cols} cols (need at least 2 x 2)")]
    EmptyGrid {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Sample count does not match the grid dimensions.
    #[error("Expected {expected} samples for the grid, got {actual}")]
    SampleCountMismatch {
        /// rows * cols.
        expected: usize,
        /// Samples actually provided.
        actual: usize,
    },

    /// The run was cancelled before the given row was issued.
    #[error("Fetch cancelled before row {row}")]
    Cancelled {
        /// First row that was not issued.
        row: usize,
    },

    /// Worker pool for concurrent fetching could not be built.
    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The mesh sink failed to accept the finished surface.
    #[error("Output error: {0}")]
    Sink(String),
}

impl TerrainError {
    /// Name of the pipeline stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            TerrainError::InvalidBoundingBox { .. } | TerrainError::InvalidResolution(_) => {
                "planning"
            }
            TerrainError::RequestTooLong { .. }
            | TerrainError::Transport { .. }
            | TerrainError::MalformedResponse { .. }
            | TerrainError::Cancelled { .. }
            | TerrainError::WorkerPool(_)
            | TerrainError::HttpClient(_) => "fetch",
            TerrainError::EmptyGrid { .. } | TerrainError::SampleCountMismatch { .. } => "mesh",
            TerrainError::Sink(_) => "output",
        }
    }

    /// True for network failures and oversized requests.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            TerrainError::RequestTooLong { .. } | TerrainError::Transport { .. }
        )
    }

    /// Row the error is attached to, if it came from fetching a row.
    pub fn row(&self) -> Option<usize> {
        match self {
            TerrainError::RequestTooLong { row, .. }
            | TerrainError::Transport { row, .. }
            | TerrainError::MalformedResponse { row, .. }
            | TerrainError::Cancelled { row } => Some(*row),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_and_row() {
        let err = TerrainError::MalformedResponse {
            row: 3,
            reason: "expected value at line 1 column 1".to_string(),
        };
        assert_eq!(err.stage(), "fetch");
        assert_eq!(err.row(), Some(3));
        assert!(!err.is_transport());

        let err = TerrainError::RequestTooLong {
            row: 0,
            length: 9000,
            limit: 8000,
        };
        assert!(err.is_transport());
        assert!(err.to_string().contains("9000"));

        let err = TerrainError::EmptyGrid { rows: 1, cols: 4 };
        assert_eq!(err.stage(), "mesh");
        assert_eq!(err.row(), None);
    }
}
