//! Record sink: one parsed record, one committed row

use crate::store::db::{Database, StoreError};
use crate::store::model::NewLogEntry;
use async_trait::async_trait;
use rusqlite::params;

/// Destination for parsed records
///
/// The pipeline treats a failed write as that record lost: the error is
/// logged upstream and the loop keeps running.
#[async_trait]
pub trait LogEntrySink: Send + Sync {
    /// Persist one record, returning its assigned id
    async fn write_entry(&self, entry: NewLogEntry) -> Result<i64, StoreError>;
}

/// SQLite implementation of [`LogEntrySink`]
pub struct SqliteLogEntrySink {
    db: Database,
}

impl SqliteLogEntrySink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LogEntrySink for SqliteLogEntrySink {
    async fn write_entry(&self, entry: NewLogEntry) -> Result<i64, StoreError> {
        let conn = self.db.conn();

        conn.execute(
            "INSERT INTO log_entries (
                server_id, timestamp, tz_offset, remote_addr, method,
                uri, http_version, status, size, referrer, user_agent
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                entry.server_id,
                entry.timestamp.timestamp(),
                entry.timestamp.offset().local_minus_utc(),
                entry.remote_addr,
                entry.method,
                entry.uri,
                entry.http_version,
                entry.status,
                entry.size,
                entry.referrer,
                entry.user_agent,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }
}
