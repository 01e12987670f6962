//! Delivery error types.
//!
//! Delivery outcomes are never errors; these cover setup and worker lifecycle.

use thiserror::Error;

/// Delivery error type.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] delivery_config_and_utils::CoreError),

    /// HTTP client construction error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid destination URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The dispatcher worker panicked or was cancelled
    #[error("Dispatcher worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Result type alias using DeliveryError.
pub type DeliveryResult<T> = Result<T, DeliveryError>;
