//! Database handle and schema loader

use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    NotFound(String),
    Schema(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::NotFound(what) => write!(f, "Not found: {}", what),
            StoreError::Schema(msg) => write!(f, "Schema error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Shared handle to the SQLite store
///
/// Constructed once at startup and passed by clone into every component
/// that needs the store (sink, repositories, analytics engine).
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and apply connection pragmas
    ///
    /// WAL keeps the single writer from blocking analytics reads;
    /// foreign_keys enforces the server -> log_entries cascade.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Schema(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Lock the underlying connection
    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    /// Run schema migrations from SQL files
    ///
    /// Reads all .sql files from the given directory in name order and
    /// executes them. Files must use "IF NOT EXISTS" clauses so the
    /// loader stays idempotent.
    pub fn run_schema_migrations(&self, schema_dir: &str) -> Result<(), StoreError> {
        let schema_path = Path::new(schema_dir);

        if !schema_path.exists() {
            return Err(StoreError::Schema(format!(
                "Schema directory not found: {}",
                schema_dir
            )));
        }

        let mut sql_files: Vec<_> = fs::read_dir(schema_path)
            .map_err(|e| StoreError::Schema(format!("Failed to read {}: {}", schema_dir, e)))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("sql"))
            .collect();

        sql_files.sort_by_key(|entry| entry.file_name());

        log::info!("🔧 Running schema migrations from: {}", schema_dir);

        let conn = self.conn();
        for entry in sql_files {
            let path = entry.path();
            let filename = path.file_name().unwrap().to_string_lossy().to_string();

            let sql_content = fs::read_to_string(&path)
                .map_err(|e| StoreError::Schema(format!("Failed to read {}: {}", filename, e)))?;

            conn.execute_batch(&sql_content)?;
            log::info!("   ├─ Applied: {}", filename);
        }

        log::info!("✅ Schema migrations complete");

        Ok(())
    }

    /// Cheap liveness probe against the store
    pub fn health_check(&self) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}
