//! Polling file tailer with rotation detection
//!
//! Watches the size of the access log and reads the delta past the last
//! observed offset each cycle. A shrink means the file was rotated or
//! truncated, so the cursor resets to zero and the same cycle re-reads
//! from the start of the new file. The cursor lives only in this task;
//! a restart begins again at end-of-file.

use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Outcome of one poll cycle
enum Cycle {
    /// Lines (if any) were delivered; sleep the normal interval
    Idle,
    /// The receiving side is gone; stop producing
    ChannelClosed,
}

pub struct LogTailer {
    path: PathBuf,
    position: u64,
    poll_interval: Duration,
    error_backoff: Duration,
}

impl LogTailer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            position: 0,
            poll_interval: POLL_INTERVAL,
            error_backoff: ERROR_BACKOFF,
        }
    }

    /// Create a tailer with custom intervals (used by tests)
    pub fn with_poll_interval(
        path: impl Into<PathBuf>,
        poll_interval: Duration,
        error_backoff: Duration,
    ) -> Self {
        let mut tailer = Self::new(path);
        tailer.poll_interval = poll_interval;
        tailer.error_backoff = error_backoff;
        tailer
    }

    /// Tail the file until shutdown, pushing non-blank lines into `tx`
    ///
    /// Only lines appended after startup are produced: the cursor starts
    /// at the current end of file. If the file does not exist at startup
    /// the task logs the condition and returns, closing the channel.
    pub async fn run(mut self, tx: mpsc::Sender<String>, mut shutdown: watch::Receiver<bool>) {
        match fs::metadata(&self.path).await {
            Ok(meta) => self.position = meta.len(),
            Err(e) => {
                log::error!("❌ Access log not found: {}: {}", self.path.display(), e);
                return;
            }
        }

        log::info!(
            "📄 Tailing {} from offset {}",
            self.path.display(),
            self.position
        );

        loop {
            let sleep_for = match self.poll_cycle(&tx).await {
                Ok(Cycle::Idle) => self.poll_interval,
                Ok(Cycle::ChannelClosed) => {
                    log::info!("Line channel closed, stopping tailer");
                    break;
                }
                Err(e) => {
                    log::error!("❌ Error while tailing {}: {}", self.path.display(), e);
                    self.error_backoff
                }
            };

            tokio::select! {
                _ = sleep(sleep_for) => {}
                _ = shutdown.changed() => {
                    log::info!("Shutdown signal received, stopping tailer");
                    break;
                }
            }
        }
    }

    /// One poll: detect rotation, read the delta, advance the cursor
    async fn poll_cycle(&mut self, tx: &mpsc::Sender<String>) -> std::io::Result<Cycle> {
        let current_size = fs::metadata(&self.path).await?.len();

        if current_size < self.position {
            log::warn!(
                "🔄 {} shrank ({} -> {} bytes), assuming rotation; re-reading from the start",
                self.path.display(),
                self.position,
                current_size
            );
            self.position = 0;
        }

        if current_size > self.position {
            let mut file = fs::File::open(&self.path).await?;
            file.seek(SeekFrom::Start(self.position)).await?;

            let mut buf = Vec::new();
            file.read_to_end(&mut buf).await?;
            let text = String::from_utf8_lossy(&buf);

            for line in text.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                if tx.send(line.to_string()).await.is_err() {
                    return Ok(Cycle::ChannelClosed);
                }
            }

            self.position = current_size;
        }

        Ok(Cycle::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;
    use tempfile::tempdir;
    use tokio::time::timeout;

    const TEST_POLL: Duration = Duration::from_millis(20);
    const RECV_WAIT: Duration = Duration::from_secs(5);

    fn append(path: &std::path::Path, content: &str) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn spawn_tailer(
        path: &std::path::Path,
    ) -> (
        mpsc::Receiver<String>,
        watch::Sender<bool>,
        tokio::task::JoinHandle<()>,
    ) {
        let (tx, rx) = mpsc::channel(100);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let tailer = LogTailer::with_poll_interval(path, TEST_POLL, TEST_POLL);
        let handle = tokio::spawn(tailer.run(tx, shutdown_rx));
        (rx, shutdown_tx, handle)
    }

    #[tokio::test]
    async fn test_only_new_lines_are_yielded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("access.log");
        std::fs::write(&path, "pre-existing line\n").unwrap();

        let (mut rx, shutdown_tx, handle) = spawn_tailer(&path);

        // Give the tailer time to capture the starting offset
        sleep(Duration::from_millis(200)).await;
        append(&path, "first new line\nsecond new line\n");

        let first = timeout(RECV_WAIT, rx.recv()).await.unwrap().unwrap();
        let second = timeout(RECV_WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(first, "first new line");
        assert_eq!(second, "second new line");

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_unchanged_file_yields_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("access.log");
        std::fs::write(&path, "stable content\n").unwrap();

        let (mut rx, shutdown_tx, handle) = spawn_tailer(&path);

        // Several poll cycles with no growth
        sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_shrink_resets_cursor_to_start() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("access.log");
        std::fs::write(&path, "a fairly long pre-existing line of content\n").unwrap();

        let (mut rx, shutdown_tx, handle) = spawn_tailer(&path);

        sleep(Duration::from_millis(200)).await;
        // Replace with a shorter file, as logrotate would
        std::fs::write(&path, "fresh\n").unwrap();

        let line = timeout(RECV_WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(line, "fresh");

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_ends_the_sequence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does_not_exist.log");

        let (mut rx, _shutdown_tx, handle) = spawn_tailer(&path);

        // Task returns immediately and the channel closes
        handle.await.unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_tailer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("access.log");
        std::fs::write(&path, "").unwrap();

        let (_rx, shutdown_tx, handle) = spawn_tailer(&path);

        sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(true).unwrap();

        timeout(RECV_WAIT, handle).await.unwrap().unwrap();
    }
}
