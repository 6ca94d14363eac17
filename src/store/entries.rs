//! Log-entry repository
//!
//! Read side for persisted records. Inserts go through the ingest sink;
//! entries are never mutated once written.

use super::db::{Database, StoreError};
use super::model::{log_entry_from_row, LogEntry};

pub struct LogEntryRepository {
    db: Database,
}

impl LogEntryRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All persisted entries, oldest first
    pub fn list(&self) -> Result<Vec<LogEntry>, StoreError> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT id, server_id, timestamp, tz_offset, remote_addr, method,
                    uri, http_version, status, size, referrer, user_agent
             FROM log_entries
             ORDER BY timestamp",
        )?;

        let entries = stmt
            .query_map([], log_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}
