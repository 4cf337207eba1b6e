//! Remote elevation service.
//!
//! The fetcher only needs "send this URL, give me the body back". Keeping
//! that behind [`ElevationService`] lets the HTTP client be swapped for a
//! fake in tests.

use crate::{Result, TerrainError};
use std::time::Duration;

/// Default elevation endpoint (IGN Géoportail altimetry REST service).
pub const DEFAULT_ENDPOINT: &str = "https://wxs.ign.fr/choisirgeoportail/alti/rest/elevation.json";

/// Default maximum request length in bytes.
pub const DEFAULT_MAX_REQUEST_LEN: usize = 8000;

/// Default HTTP timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Something that answers elevation queries.
pub trait ElevationService: Send + Sync {
    /// Base URL queries are appended to.
    fn endpoint(&self) -> &str;

    /// Issue a GET for `url` and return the response body.
    ///
    /// `row` is only used to label errors.
    fn get(&self, row: usize, url: &str) -> Result<String>;
}

impl<T: ElevationService + ?Sized> ElevationService for &T {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    fn get(&self, row: usize, url: &str) -> Result<String> {
        (**self).get(row, url)
    }
}

impl<T: ElevationService + ?Sized> ElevationService for Box<T> {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    fn get(&self, row: usize, url: &str) -> Result<String> {
        (**self).get(row, url)
    }
}

/// Blocking HTTP client for the elevation service.
pub struct HttpElevationService {
    /// Base URL for queries.
    endpoint: String,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for HttpElevationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpElevationService")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpElevationService {
    /// Create a client for the default endpoint.
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client for a specific endpoint and timeout.
    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("geoalt/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

impl ElevationService for HttpElevationService {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn get(&self, row: usize, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TerrainError::Transport {
                row,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let reason = if status == reqwest::StatusCode::URI_TOO_LONG {
                format!("HTTP {} (request of {} bytes rejected)", status, url.len())
            } else {
                format!("HTTP {}", status)
            };
            return Err(TerrainError::Transport { row, reason });
        }

        response.text().map_err(|e| TerrainError::Transport {
            row,
            reason: format!("failed to read body: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let service = HttpElevationService::new().unwrap();
        assert_eq!(service.endpoint(), DEFAULT_ENDPOINT);
        assert!(format!("{:?}", service).contains("wxs.ign.fr"));
    }

    #[test]
    fn test_unusable_url_is_transport_error() {
        // Rejected while building the request, before any connection is made
        let service =
            HttpElevationService::with_endpoint("elevation.json", Duration::from_secs(2)).unwrap();
        let err = service.get(7, "elevation.json?lon=1&lat=2").unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.row(), Some(7));
        assert!(err.to_string().contains("row 7"), "{}", err);
    }
}
