//! Durable store: database handle, schema loader and per-entity repositories
//!
//! Every component that touches the store receives an explicitly
//! constructed [`db::Database`] handle by clone. There is no process-wide
//! connection registry; tests build isolated handles over scratch files.

pub mod db;
pub mod entries;
pub mod model;
pub mod servers;

pub use db::{Database, StoreError};
pub use entries::LogEntryRepository;
pub use model::{LogEntry, NewLogEntry, NewServer, Server};
pub use servers::ServerRepository;
