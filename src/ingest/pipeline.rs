//! Ingestion loop: line channel -> parser -> sink

use super::parser::AccessLogParser;
use super::sink::LogEntrySink;
use crate::store::model::NewLogEntry;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};

const REPORT_INTERVAL_SECS: u64 = 10;

/// Consume raw lines for one (file, server id) pair until the channel
/// closes or shutdown flips
///
/// Per line: parse, attach the configured server id, hand to the sink.
/// A parse miss or a failed write drops that line and the loop keeps
/// going; nothing here terminates the pipeline early.
pub async fn run_ingestion(
    mut rx: mpsc::Receiver<String>,
    parser: AccessLogParser,
    sink: Arc<dyn LogEntrySink>,
    server_id: i64,
    mut shutdown: watch::Receiver<bool>,
) {
    log::info!("🚀 Starting ingestion for server {}", server_id);

    let mut persisted = 0u64;
    let mut skipped = 0u64;
    let mut last_report = Instant::now();

    loop {
        tokio::select! {
            maybe_line = rx.recv() => {
                match maybe_line {
                    Some(line) => {
                        match parser.parse_line(&line) {
                            Some(parsed) => {
                                let entry = NewLogEntry::from_parsed(server_id, parsed);
                                match sink.write_entry(entry).await {
                                    Ok(_) => persisted += 1,
                                    Err(e) => {
                                        // Record dropped; the store simply ends
                                        // up with fewer rows than the log
                                        log::error!("❌ Failed to persist log entry: {}", e);
                                    }
                                }
                            }
                            None => skipped += 1,
                        }

                        if last_report.elapsed().as_secs() >= REPORT_INTERVAL_SECS {
                            log::info!(
                                "📊 Ingestion: {} persisted, {} skipped",
                                persisted,
                                skipped
                            );
                            last_report = Instant::now();
                        }
                    }
                    None => {
                        log::info!("Line channel closed, stopping ingestion");
                        break;
                    }
                }
            }
            _ = shutdown.changed() => {
                log::info!("Shutdown signal received, stopping ingestion");
                break;
            }
        }
    }

    log::info!(
        "✅ Ingestion stopped: {} persisted, {} skipped",
        persisted,
        skipped
    );
}
