//! Aggregate queries over the persisted record set
//!
//! Each operation computes its own window start from the wall clock,
//! runs one read against the store and maps rows into the boundary
//! types. Ordering ties are broken by the grouping key ascending so
//! results are deterministic across runs.

use super::types::{
    ErrorEntry, StatusCodeStats, TimeSeriesPoint, TimeSeriesQuery, TopIpStats, TopQuery,
    TopUriStats, TrafficStats, WindowQuery,
};
use crate::store::db::{Database, StoreError};
use crate::store::model::timestamp_from_parts;
use chrono::{DateTime, Utc};
use rusqlite::params;

/// Hard cap on the error feed
const ERROR_FEED_LIMIT: i64 = 100;

/// Fixed time-series bucket width in seconds (one hour)
const BUCKET_SECS: i64 = 3600;

pub struct AnalyticsEngine {
    db: Database,
}

impl AnalyticsEngine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn window_start(hours: i64) -> i64 {
        Utc::now().timestamp() - hours * 3600
    }

    /// Status-code histogram over the window, busiest status first
    pub fn status_codes(&self, query: WindowQuery) -> Result<Vec<StatusCodeStats>, StoreError> {
        let since = Self::window_start(query.hours);
        let conn = self.db.conn();

        let mut stmt = conn.prepare(
            "SELECT status, COUNT(id) AS requests
             FROM log_entries
             WHERE timestamp >= ?1
             GROUP BY status
             ORDER BY requests DESC, status ASC",
        )?;

        let stats = stmt
            .query_map([since], |row| {
                Ok(StatusCodeStats {
                    status: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(stats)
    }

    /// Busiest client addresses over the window
    pub fn top_ips(&self, query: TopQuery) -> Result<Vec<TopIpStats>, StoreError> {
        let since = Self::window_start(query.hours);
        let conn = self.db.conn();

        let mut stmt = conn.prepare(
            "SELECT remote_addr, COUNT(id) AS requests,
                    CAST(COALESCE(AVG(size), 0) AS INTEGER) AS avg_size
             FROM log_entries
             WHERE timestamp >= ?1
             GROUP BY remote_addr
             ORDER BY requests DESC, remote_addr ASC
             LIMIT ?2",
        )?;

        let stats = stmt
            .query_map(params![since, query.limit], |row| {
                Ok(TopIpStats {
                    ip: row.get(0)?,
                    requests: row.get(1)?,
                    avg_size: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(stats)
    }

    /// Busiest request targets over the window
    pub fn top_uris(&self, query: TopQuery) -> Result<Vec<TopUriStats>, StoreError> {
        let since = Self::window_start(query.hours);
        let conn = self.db.conn();

        let mut stmt = conn.prepare(
            "SELECT uri, COUNT(id) AS requests,
                    CAST(COALESCE(AVG(size), 0) AS INTEGER) AS avg_size
             FROM log_entries
             WHERE timestamp >= ?1
             GROUP BY uri
             ORDER BY requests DESC, uri ASC
             LIMIT ?2",
        )?;

        let stats = stmt
            .query_map(params![since, query.limit], |row| {
                Ok(TopUriStats {
                    url: row.get(0)?,
                    requests: row.get(1)?,
                    avg_size: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(stats)
    }

    /// Traffic totals over the window; zeros when the window is empty
    pub fn traffic(&self, query: WindowQuery) -> Result<TrafficStats, StoreError> {
        let since = Self::window_start(query.hours);
        let conn = self.db.conn();

        let stats = conn.query_row(
            "SELECT COUNT(id),
                    COALESCE(SUM(size), 0),
                    CAST(COALESCE(AVG(size), 0) AS INTEGER),
                    COUNT(DISTINCT remote_addr)
             FROM log_entries
             WHERE timestamp >= ?1",
            [since],
            |row| {
                Ok(TrafficStats {
                    total_requests: row.get(0)?,
                    total_bytes: row.get(1)?,
                    avg_request_size: row.get(2)?,
                    unique_ips: row.get(3)?,
                    period_hours: query.hours,
                })
            },
        )?;

        Ok(stats)
    }

    /// Request/byte counts per fixed one-hour bucket, chronological
    ///
    /// `query.interval_minutes` is deliberately not consulted; see the
    /// field documentation.
    pub fn time_series(&self, query: TimeSeriesQuery) -> Result<Vec<TimeSeriesPoint>, StoreError> {
        let since = Self::window_start(query.hours);
        let conn = self.db.conn();

        let mut stmt = conn.prepare(
            "SELECT (timestamp - (timestamp % ?2)) AS bucket,
                    COUNT(id) AS requests,
                    COALESCE(SUM(size), 0) AS bytes
             FROM log_entries
             WHERE timestamp >= ?1
             GROUP BY bucket
             ORDER BY bucket ASC",
        )?;

        let points = stmt
            .query_map(params![since, BUCKET_SECS], |row| {
                let bucket: i64 = row.get(0)?;
                Ok(TimeSeriesPoint {
                    timestamp: DateTime::<Utc>::from_timestamp(bucket, 0)
                        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
                    requests: row.get(1)?,
                    bytes: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(points)
    }

    /// Records with status >= 400 in the window, most recent first
    pub fn errors(&self, query: WindowQuery) -> Result<Vec<ErrorEntry>, StoreError> {
        let since = Self::window_start(query.hours);
        let conn = self.db.conn();

        let mut stmt = conn.prepare(
            "SELECT status, uri, remote_addr, timestamp, tz_offset, user_agent
             FROM log_entries
             WHERE timestamp >= ?1 AND status >= 400
             ORDER BY timestamp DESC
             LIMIT ?2",
        )?;

        let entries = stmt
            .query_map(params![since, ERROR_FEED_LIMIT], |row| {
                let epoch: i64 = row.get(3)?;
                let offset: i32 = row.get(4)?;
                Ok(ErrorEntry {
                    status: row.get(0)?,
                    url: row.get(1)?,
                    ip: row.get(2)?,
                    timestamp: timestamp_from_parts(epoch, offset),
                    user_agent: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}
