//! logflow - access-log ingestion and windowed traffic analytics
//!
//! The crate tails a web-server access log, parses each appended line into
//! a structured record, persists accepted records to SQLite, and answers
//! aggregate queries (status histograms, top talkers, traffic totals,
//! time series, error feeds) over a rolling look-back window.
//!
//! ## Module Organization
//!
//! - `config` - Runtime configuration from environment variables
//! - `ingest` - Tailer, line parser, record sink and the ingestion loop
//! - `store` - Database handle, schema loader and per-entity repositories
//! - `analytics` - Windowed aggregate queries over persisted records

pub mod analytics;
pub mod config;
pub mod ingest;
pub mod store;

// Re-export commonly used types
pub use analytics::engine::AnalyticsEngine;
pub use config::MonitorConfig;
pub use ingest::parser::AccessLogParser;
pub use ingest::pipeline::run_ingestion;
pub use ingest::sink::{LogEntrySink, SqliteLogEntrySink};
pub use ingest::tailer::LogTailer;
pub use store::db::{Database, StoreError};
