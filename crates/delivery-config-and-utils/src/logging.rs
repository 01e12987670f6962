//! Logging initialization for delivery processes.
//!
//! Wraps the observability crate. Output goes to stderr; setting
//! `EVENTS_LOG_FILE` additionally writes JSONL to that file.

use crate::CoreResult;
use observability::{LogConfig, LogFormat};
use std::path::PathBuf;

/// Initialize the logging system for a delivery process.
///
/// - Level from `RUST_LOG`, or the provided default
/// - `EVENTS_LOG_FORMAT=json` switches stderr to JSON lines
/// - `EVENTS_LOG_FILE=<path>` adds an append-only JSONL file
///
/// ```ignore
/// init_logging("event-sender", "info")?;
/// tracing::info!("sender started");
/// ```
pub fn init_logging(service_name: &str, level: &str) -> CoreResult<()> {
    let format = std::env::var("EVENTS_LOG_FORMAT")
        .map(|raw| LogFormat::parse(&raw))
        .unwrap_or_default();

    let log_path = std::env::var("EVENTS_LOG_FILE")
        .ok()
        .and_then(non_empty_env)
        .map(PathBuf::from);

    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: level.into(),
        log_path,
        also_stderr: true,
        format,
    })?;

    Ok(())
}

fn non_empty_env(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_env_trims() {
        assert_eq!(non_empty_env("  ".to_string()), None);
        assert_eq!(
            non_empty_env(" /tmp/x.jsonl ".to_string()),
            Some("/tmp/x.jsonl".to_string())
        );
    }
}
