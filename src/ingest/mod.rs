//! Ingestion pipeline: tailer -> parser -> sink
//!
//! The tailer runs as an independent task pushing raw lines into a
//! bounded channel; the ingestion loop consumes the channel, parses each
//! line and hands accepted records to the sink. One pipeline serves one
//! (file, server id) pair; several pipelines may run side by side over
//! the same database handle.

pub mod parser;
pub mod pipeline;
pub mod sink;
pub mod tailer;

pub use parser::{AccessLogParser, ParsedLine};
pub use pipeline::run_ingestion;
pub use sink::{LogEntrySink, SqliteLogEntrySink};
pub use tailer::LogTailer;
