//! Elevation query serialization.
//!
//! The service takes two `|`-separated lists of equal length, `lon` and
//! `lat`. Each query covers one grid row, so every `lat` entry is the row's
//! latitude. The separator is percent-encoded so the length checked here is
//! the length that goes on the wire.

use crate::grid::SampleGrid;
use crate::{Result, TerrainError};
use std::fmt::Write;

/// Encoded list separator (`|`).
const LIST_SEPARATOR: &str = "%7C";

/// One row's worth of query points.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationQuery {
    row: usize,
    lons: Vec<f64>,
    lats: Vec<f64>,
}

impl ElevationQuery {
    /// Query for every column of `row`.
    pub fn for_row(grid: &SampleGrid, row: usize) -> Self {
        let lons = grid.col_lons();
        let lats = vec![grid.row_lat(row); lons.len()];
        Self { row, lons, lats }
    }

    /// Row this query belongs to.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Number of points requested.
    pub fn len(&self) -> usize {
        self.lons.len()
    }

    /// True if no points are requested.
    pub fn is_empty(&self) -> bool {
        self.lons.is_empty()
    }

    /// Requested longitudes, in response order.
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Requested latitudes, in response order.
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Full request URL for `endpoint`.
    pub fn to_url(&self, endpoint: &str) -> String {
        let mut url = String::with_capacity(endpoint.len() + 32 * self.len());
        url.push_str(endpoint);
        url.push(if endpoint.contains('?') { '&' } else { '?' });
        url.push_str("lon=");
        push_list(&mut url, &self.lons);
        url.push_str("&lat=");
        push_list(&mut url, &self.lats);
        url
    }

    /// Request URL, or [`TerrainError::RequestTooLong`] if it exceeds `limit` bytes.
    pub fn to_checked_url(&self, endpoint: &str, limit: usize) -> Result<String> {
        let url = self.to_url(endpoint);
        if url.len() > limit {
            return Err(TerrainError::RequestTooLong {
                row: self.row,
                length: url.len(),
                limit,
            });
        }
        Ok(url)
    }
}

fn push_list(out: &mut String, values: &[f64]) {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(LIST_SEPARATOR);
        }
        // Writing to a String cannot fail
        let _ = write!(out, "{}", value);
    }
}
