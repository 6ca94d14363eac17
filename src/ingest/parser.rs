//! Combined-log-format line parser
//!
//! Total over all input strings: any line that does not match the format,
//! or whose timestamp/status/size fail to convert, is reported as a miss
//! rather than a partial record.

use chrono::{DateTime, FixedOffset};
use regex::Regex;

const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

const LOG_PATTERN: &str = concat!(
    r#"^(?P<remote_addr>\S+) - - \[(?P<timestamp>[^\]]+)\] "#,
    r#""(?P<method>\S+) (?P<uri>\S+) (?P<http_version>[^"]+)" "#,
    r#"(?P<status>\d{3}) (?P<size>\d+) "(?P<referrer>[^"]*)" "(?P<user_agent>[^"]*)""#,
);

/// Fields captured from one access-log line
///
/// Carries no server id; the pipeline attaches it before persisting.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub timestamp: DateTime<FixedOffset>,
    pub remote_addr: String,
    pub method: String,
    pub uri: String,
    pub http_version: String,
    pub status: u16,
    pub size: i64,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

pub struct AccessLogParser {
    pattern: Regex,
}

impl Default for AccessLogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessLogParser {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(LOG_PATTERN).expect("combined log pattern is valid"),
        }
    }

    /// Parse one line of the access log
    ///
    /// Returns `None` for anything that is not a complete, well-formed
    /// record. A literal `-` in referrer or user-agent means the field
    /// was absent.
    pub fn parse_line(&self, line: &str) -> Option<ParsedLine> {
        let line = line.trim();

        let caps = match self.pattern.captures(line) {
            Some(caps) => caps,
            None => {
                log::debug!("Line did not match access log format: {}", line);
                return None;
            }
        };

        let timestamp = match DateTime::parse_from_str(&caps["timestamp"], TIMESTAMP_FORMAT) {
            Ok(ts) => ts,
            Err(e) => {
                log::warn!("Failed to parse line '{}': {}", line, e);
                return None;
            }
        };

        // \d{3} and \d+ keep these numeric; conversion can still overflow
        let status: u16 = caps["status"].parse().ok()?;
        let size: i64 = caps["size"].parse().ok()?;

        Some(ParsedLine {
            timestamp,
            remote_addr: caps["remote_addr"].to_string(),
            method: caps["method"].to_string(),
            uri: caps["uri"].to_string(),
            http_version: caps["http_version"].to_string(),
            status,
            size,
            referrer: absent_if_dash(&caps["referrer"]),
            user_agent: absent_if_dash(&caps["user_agent"]),
        })
    }
}

fn absent_if_dash(value: &str) -> Option<String> {
    if value == "-" {
        None
    } else {
        Some(value.to_string())
    }
}
