//! # Observability
//!
//! Centralized logging layer for the event delivery workspace.
//!
//! ## Design Philosophy
//!
//! Crates are **log producers**. They use standard `tracing` macros and never
//! decide where lines go. A process calls [`init_with_config`] once at
//! startup; that call decides between human-readable stderr output and
//! structured JSONL written to a file.
//!
//! ## Usage
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "event-sender".into(),
//!     default_level: "debug".into(),
//!     log_path: Some("/var/log/events/delivery.jsonl".into()),
//!     ..Default::default()
//! })?;
//! ```

mod file_sink;

use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

pub use file_sink::{FileLogWriter, FileWriterFactory};

/// Output format for the stderr stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line human-readable output.
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parse a format name, falling back to [`LogFormat::Compact`].
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" | "jsonl" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, recorded once at startup.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional JSONL log file. When unset, nothing is written to disk.
    pub log_path: Option<PathBuf>,

    /// Emit logs to stderr. Forced on when no log file is configured.
    pub also_stderr: bool,

    /// Format of the stderr stream. The file stream is always JSON.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: true,
            format: LogFormat::Compact,
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the observability layer with custom configuration.
///
/// Returns an error only when the configured log file cannot be opened.
/// Calling this after a global subscriber is already installed is a no-op.
pub fn init_with_config(config: LogConfig) -> std::io::Result<()> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if let Some(path) = &config.log_path {
        let writer = FileLogWriter::new(path)?;
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_writer(FileWriterFactory::new(writer))
                .with_filter(env_filter(&config.default_level))
                .boxed(),
        );
    }

    if config.also_stderr || config.log_path.is_none() {
        let stderr_layer = match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(env_filter(&config.default_level))
                .boxed(),
            LogFormat::Compact => tracing_subscriber::fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(env_filter(&config.default_level))
                .boxed(),
        };
        layers.push(stderr_layer);
    }

    if tracing_subscriber::registry().with(layers).try_init().is_err() {
        return Ok(());
    }

    tracing::info!(
        service = %config.service_name,
        pid = std::process::id(),
        log_path = ?config.log_path,
        "observability initialized"
    );
    Ok(())
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
