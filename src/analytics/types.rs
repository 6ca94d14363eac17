//! Query parameters and result shapes for the analytics engine
//!
//! These types cross the boundary to the request-handling layer, so the
//! parameters deserialize (with the documented defaults) and the results
//! serialize.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

fn default_hours() -> i64 {
    24
}

fn default_limit() -> u32 {
    10
}

/// Look-back window for an aggregate query
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WindowQuery {
    /// Hours to look back from now
    #[serde(default = "default_hours")]
    pub hours: i64,
}

impl Default for WindowQuery {
    fn default() -> Self {
        Self { hours: 24 }
    }
}

/// Window plus result cap for top-N queries
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TopQuery {
    #[serde(default = "default_hours")]
    pub hours: i64,

    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for TopQuery {
    fn default() -> Self {
        Self {
            hours: 24,
            limit: 10,
        }
    }
}

/// Window for the time-series query
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TimeSeriesQuery {
    #[serde(default = "default_hours")]
    pub hours: i64,

    /// Accepted for wire compatibility but not applied: buckets are
    /// fixed at one hour. Callers must not rely on this value.
    #[serde(default)]
    pub interval_minutes: Option<u32>,
}

impl Default for TimeSeriesQuery {
    fn default() -> Self {
        Self {
            hours: 24,
            interval_minutes: None,
        }
    }
}

/// Request count for one HTTP status code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCodeStats {
    pub status: u16,
    pub count: i64,
}

/// Request count and mean response size for one client address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopIpStats {
    pub ip: String,
    pub requests: i64,
    pub avg_size: i64,
}

/// Request count and mean response size for one request target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopUriStats {
    pub url: String,
    pub requests: i64,
    pub avg_size: i64,
}

/// Totals over the window; every field is 0 when the window is empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficStats {
    pub total_requests: i64,
    pub total_bytes: i64,
    pub avg_request_size: i64,
    pub unique_ips: i64,
    pub period_hours: i64,
}

/// One fixed-width bucket of the request time series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSeriesPoint {
    /// Bucket start (UTC, aligned to the hour)
    pub timestamp: DateTime<Utc>,
    pub requests: i64,
    pub bytes: i64,
}

/// One record from the error feed (status >= 400)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub status: u16,
    pub url: String,
    pub ip: String,
    pub timestamp: DateTime<FixedOffset>,
    pub user_agent: Option<String>,
}
