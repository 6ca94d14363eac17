//! Row types shared by the sink, the repositories and the analytics engine

use crate::ingest::parser::ParsedLine;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// A monitored origin server
#[derive(Debug, Clone, Serialize)]
pub struct Server {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub ip_address: String,
}

/// Payload for creating a server
#[derive(Debug, Clone)]
pub struct NewServer {
    pub name: String,
    pub description: Option<String>,
    pub ip_address: String,
}

/// One persisted request record
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub server_id: i64,
    pub timestamp: DateTime<FixedOffset>,
    pub remote_addr: String,
    pub method: String,
    pub uri: String,
    pub http_version: String,
    pub status: u16,
    pub size: i64,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

/// A parsed record waiting to be persisted
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub server_id: i64,
    pub timestamp: DateTime<FixedOffset>,
    pub remote_addr: String,
    pub method: String,
    pub uri: String,
    pub http_version: String,
    pub status: u16,
    pub size: i64,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

impl NewLogEntry {
    /// Attach the configured server id to a parsed line
    ///
    /// The parser never derives the server id from the line; the pipeline
    /// supplies it here.
    pub fn from_parsed(server_id: i64, line: ParsedLine) -> Self {
        Self {
            server_id,
            timestamp: line.timestamp,
            remote_addr: line.remote_addr,
            method: line.method,
            uri: line.uri,
            http_version: line.http_version,
            status: line.status,
            size: line.size,
            referrer: line.referrer,
            user_agent: line.user_agent,
        }
    }
}

/// Rebuild an offset-aware instant from its stored parts
///
/// Rows store UTC epoch seconds plus the offset parsed from the original
/// line, so the instant round-trips with its zone.
pub(crate) fn timestamp_from_parts(epoch: i64, offset_secs: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(offset_secs)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
    let utc = DateTime::<Utc>::from_timestamp(epoch, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    utc.with_timezone(&offset)
}

/// Map a full log_entries row (id, server_id, timestamp, tz_offset,
/// remote_addr, method, uri, http_version, status, size, referrer,
/// user_agent) onto [`LogEntry`].
pub(crate) fn log_entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogEntry> {
    let epoch: i64 = row.get(2)?;
    let offset_secs: i32 = row.get(3)?;

    Ok(LogEntry {
        id: row.get(0)?,
        server_id: row.get(1)?,
        timestamp: timestamp_from_parts(epoch, offset_secs),
        remote_addr: row.get(4)?,
        method: row.get(5)?,
        uri: row.get(6)?,
        http_version: row.get(7)?,
        status: row.get(8)?,
        size: row.get(9)?,
        referrer: row.get(10)?,
        user_agent: row.get(11)?,
    })
}
