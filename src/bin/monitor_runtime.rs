//! Monitor runtime
//!
//! Wires one ingestion pipeline together: opens the database, applies the
//! schema, then runs the tailer and the ingestion loop as independent
//! tasks joined by a bounded channel. Ctrl-C flips the shutdown signal
//! and both tasks stop between cycles.
//!
//! Usage:
//!   cargo run --release --bin monitor_runtime
//!
//! Environment variables:
//!   LOGFLOW_DB_PATH       - SQLite database path (default: logflow.db)
//!   ACCESS_LOG_PATH       - Access log to tail (default: /var/log/nginx/access.log)
//!   LOGFLOW_SERVER_ID     - Server id for ingested records (default: 1)
//!   INGEST_CHANNEL_BUFFER - Line channel size (default: 10000)
//!   LOGFLOW_SCHEMA_DIR    - Schema file directory (default: sql)

use dotenv::dotenv;
use log::info;
use logflow::ingest::{run_ingestion, AccessLogParser, LogEntrySink, LogTailer, SqliteLogEntrySink};
use logflow::store::db::Database;
use logflow::MonitorConfig;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    info!("🚀 logflow monitor runtime");

    let config = MonitorConfig::from_env();
    config.validate()?;

    info!("   ├─ Database: {}", config.db_path);
    info!("   ├─ Access log: {}", config.access_log_path);
    info!("   ├─ Server id: {}", config.server_id);
    info!("   └─ Channel buffer: {} lines", config.channel_buffer);

    let db = Database::open(&config.db_path)?;
    db.run_schema_migrations(&config.schema_dir)?;
    db.health_check()?;
    info!("✅ Database ready");

    let sink: Arc<dyn LogEntrySink> = Arc::new(SqliteLogEntrySink::new(db.clone()));
    let (tx, rx) = mpsc::channel(config.channel_buffer);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let tailer = LogTailer::new(&config.access_log_path);
    let tailer_handle = tokio::spawn(tailer.run(tx, shutdown_rx.clone()));

    let mut ingest_handle = tokio::spawn(run_ingestion(
        rx,
        AccessLogParser::new(),
        sink,
        config.server_id,
        shutdown_rx,
    ));

    let interrupted = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
            let _ = shutdown_tx.send(true);
            true
        }
        // The pipeline ends on its own when the tailer stops producing
        // (missing file at startup)
        res = &mut ingest_handle => {
            let _ = res;
            false
        }
    };

    if interrupted {
        let _ = ingest_handle.await;
    }
    let _ = tailer_handle.await;
    info!("✅ Monitor runtime stopped");

    Ok(())
}
