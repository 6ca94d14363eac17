//! Monitor configuration from environment variables

use std::env;

/// Configuration for the monitor runtime
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Path to the SQLite database file
    pub db_path: String,

    /// Path to the access log being tailed
    pub access_log_path: String,

    /// Server id attached to every ingested record
    pub server_id: i64,

    /// Channel buffer size between the tailer and the ingestion loop (lines)
    pub channel_buffer: usize,

    /// Directory holding the numbered schema files
    pub schema_dir: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl MonitorConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `LOGFLOW_DB_PATH` (default: logflow.db)
    /// - `ACCESS_LOG_PATH` (default: /var/log/nginx/access.log)
    /// - `LOGFLOW_SERVER_ID` (default: 1)
    /// - `INGEST_CHANNEL_BUFFER` (default: 10000)
    /// - `LOGFLOW_SCHEMA_DIR` (default: sql)
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("LOGFLOW_DB_PATH").unwrap_or_else(|_| "logflow.db".to_string()),

            access_log_path: env::var("ACCESS_LOG_PATH")
                .unwrap_or_else(|_| "/var/log/nginx/access.log".to_string()),

            server_id: env::var("LOGFLOW_SERVER_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),

            channel_buffer: env::var("INGEST_CHANNEL_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000),

            schema_dir: env::var("LOGFLOW_SCHEMA_DIR").unwrap_or_else(|_| "sql".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_id < 1 {
            return Err(ConfigError::InvalidValue(format!(
                "LOGFLOW_SERVER_ID must be positive, got {}",
                self.server_id
            )));
        }

        if self.access_log_path.is_empty() {
            return Err(ConfigError::InvalidValue(
                "ACCESS_LOG_PATH cannot be empty".to_string(),
            ));
        }

        if self.channel_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "INGEST_CHANNEL_BUFFER cannot be zero".to_string(),
            ));
        }

        Ok(())
    }
}
