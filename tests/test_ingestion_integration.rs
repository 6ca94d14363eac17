//! End-to-end ingestion tests: append -> poll -> parse -> persist -> query
//!
//! Exercises the full pipeline the monitor runtime wires together: a
//! tailer task feeding the ingestion loop over a bounded channel, with
//! records landing in a scratch SQLite database and read back through
//! the repositories and the analytics engine.

use chrono::Utc;
use logflow::analytics::{AnalyticsEngine, WindowQuery};
use logflow::ingest::{run_ingestion, AccessLogParser, LogEntrySink, LogTailer, SqliteLogEntrySink};
use logflow::store::db::Database;
use logflow::store::entries::LogEntryRepository;
use logflow::store::model::NewServer;
use logflow::store::servers::ServerRepository;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;

fn access_line(ip: &str, uri: &str, status: u16, size: i64) -> String {
    // Stamped with the current instant so the analytics window sees it
    let ts = Utc::now().format("%d/%b/%Y:%H:%M:%S +0000");
    format!(
        "{} - - [{}] \"GET {} HTTP/1.1\" {} {} \"-\" \"logflow-test\"\n",
        ip, ts, uri, status, size
    )
}

#[tokio::test]
async fn test_tail_parse_persist_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("logflow.db")).unwrap();
    db.run_schema_migrations("sql").unwrap();

    let server = ServerRepository::new(db.clone())
        .create(NewServer {
            name: "web-1".to_string(),
            description: None,
            ip_address: "10.0.0.1".to_string(),
        })
        .unwrap();

    // Pre-existing content must not be ingested
    let log_path = dir.path().join("access.log");
    std::fs::write(&log_path, access_line("198.51.100.1", "/old", 200, 10)).unwrap();

    let (tx, rx) = mpsc::channel(100);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let tailer = LogTailer::with_poll_interval(
        &log_path,
        Duration::from_millis(20),
        Duration::from_millis(20),
    );
    let tailer_handle = tokio::spawn(tailer.run(tx, shutdown_rx.clone()));

    let sink: Arc<dyn LogEntrySink> = Arc::new(SqliteLogEntrySink::new(db.clone()));
    let ingest_handle = tokio::spawn(run_ingestion(
        rx,
        AccessLogParser::new(),
        sink,
        server.id,
        shutdown_rx,
    ));

    // Let the tailer capture the starting offset before appending
    sleep(Duration::from_millis(300)).await;

    {
        let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
        file.write_all(access_line("203.0.113.5", "/api/users", 200, 1234).as_bytes())
            .unwrap();
        file.write_all(b"this line matches nothing\n").unwrap();
        file.write_all(access_line("203.0.113.6", "/api/login", 401, 567).as_bytes())
            .unwrap();
    }

    // Poll until both valid records are persisted
    let entry_repo = LogEntryRepository::new(db.clone());
    let mut persisted = 0;
    for _ in 0..250 {
        persisted = entry_repo.list().unwrap().len();
        if persisted == 2 {
            break;
        }
        sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(persisted, 2, "expected both appended records to persist");

    shutdown_tx.send(true).unwrap();
    tailer_handle.await.unwrap();
    ingest_handle.await.unwrap();

    // Records carry the configured server id and parsed fields
    let (_, entries) = ServerRepository::new(db.clone())
        .get_with_entries(server.id)
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.server_id == server.id));
    assert!(entries.iter().any(|e| e.uri == "/api/users" && e.status == 200));
    assert!(entries.iter().any(|e| e.uri == "/api/login" && e.status == 401));
    assert!(entries
        .iter()
        .all(|e| e.user_agent.as_deref() == Some("logflow-test")));

    // And the analytics window sees exactly what was ingested
    let engine = AnalyticsEngine::new(db);
    let traffic = engine.traffic(WindowQuery { hours: 1 }).unwrap();
    assert_eq!(traffic.total_requests, 2);
    assert_eq!(traffic.total_bytes, 1234 + 567);
    assert_eq!(traffic.unique_ips, 2);

    let errors = engine.errors(WindowQuery { hours: 1 }).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].status, 401);
    assert_eq!(errors[0].url, "/api/login");
}

#[tokio::test]
async fn test_rotation_mid_stream_re_reads_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("logflow.db")).unwrap();
    db.run_schema_migrations("sql").unwrap();

    let server = ServerRepository::new(db.clone())
        .create(NewServer {
            name: "web-1".to_string(),
            description: None,
            ip_address: "10.0.0.1".to_string(),
        })
        .unwrap();

    let log_path = dir.path().join("access.log");
    // Long enough that the rotated replacement is strictly smaller
    std::fs::write(
        &log_path,
        access_line("198.51.100.1", "/very/long/pre-existing/path/before/rotation", 200, 10),
    )
    .unwrap();

    let (tx, rx) = mpsc::channel(100);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let tailer = LogTailer::with_poll_interval(
        &log_path,
        Duration::from_millis(20),
        Duration::from_millis(20),
    );
    let tailer_handle = tokio::spawn(tailer.run(tx, shutdown_rx.clone()));

    let sink: Arc<dyn LogEntrySink> = Arc::new(SqliteLogEntrySink::new(db.clone()));
    let ingest_handle = tokio::spawn(run_ingestion(
        rx,
        AccessLogParser::new(),
        sink,
        server.id,
        shutdown_rx,
    ));

    sleep(Duration::from_millis(300)).await;

    // Rotate: replace the file with fresh, shorter content
    std::fs::write(&log_path, access_line("203.0.113.9", "/after", 200, 99)).unwrap();

    let entry_repo = LogEntryRepository::new(db.clone());
    let mut persisted = 0;
    for _ in 0..250 {
        persisted = entry_repo.list().unwrap().len();
        if persisted == 1 {
            break;
        }
        sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(persisted, 1, "expected the post-rotation record to persist");

    shutdown_tx.send(true).unwrap();
    tailer_handle.await.unwrap();
    ingest_handle.await.unwrap();

    let (_, entries) = ServerRepository::new(db)
        .get_with_entries(server.id)
        .unwrap();
    assert_eq!(entries[0].uri, "/after");
    assert_eq!(entries[0].remote_addr, "203.0.113.9");
}
