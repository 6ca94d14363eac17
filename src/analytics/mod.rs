//! Windowed aggregate queries over persisted records
//!
//! Stateless: every call reads the store through the shared handle and
//! computes a fresh result for its look-back window. Any number of
//! callers may query concurrently.

pub mod engine;
pub mod types;

pub use engine::AnalyticsEngine;
pub use types::{
    ErrorEntry, StatusCodeStats, TimeSeriesPoint, TimeSeriesQuery, TopIpStats, TopQuery,
    TopUriStats, TrafficStats, WindowQuery,
};
