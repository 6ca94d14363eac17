//! Log file checker
//!
//! Quick sanity tool: stats the file and parses the first few lines,
//! reporting whether they match the combined access-log format.
//!
//! Usage:
//!   cargo run --bin log_check -- <path-to-access-log>

use log::{error, info, warn};
use logflow::AccessLogParser;
use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::process;

const PREVIEW_LINES: usize = 5;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let path = match args.get(1) {
        Some(path) => path,
        None => {
            eprintln!("Usage: log_check <path-to-access-log>");
            process::exit(2);
        }
    };

    let metadata = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) => {
            error!("❌ Log file not found: {}: {}", path, e);
            process::exit(1);
        }
    };

    info!("Checking file: {}", path);
    info!("File size: {} bytes", metadata.len());

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            error!("❌ Failed to open {}: {}", path, e);
            process::exit(1);
        }
    };

    let parser = AccessLogParser::new();
    let mut shown = 0usize;
    let mut matched = 0usize;

    for line in BufReader::new(file).lines() {
        if shown >= PREVIEW_LINES {
            break;
        }

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("❌ Failed to read {}: {}", path, e);
                process::exit(1);
            }
        };

        if line.trim().is_empty() {
            continue;
        }
        shown += 1;

        match parser.parse_line(&line) {
            Some(parsed) => {
                matched += 1;
                info!(
                    "Line {}: ok ({} {} -> {} {} bytes)",
                    shown, parsed.method, parsed.uri, parsed.status, parsed.size
                );
            }
            None => {
                warn!("Line {}: does not match the access log format", shown);
            }
        }
    }

    if shown == 0 {
        warn!("File contains no lines to check");
    } else {
        info!("{}/{} previewed lines matched", matched, shown);
    }
}
