//! Configuration, error types and logging setup shared by the event delivery crates.

mod config;
mod error;
mod logging;

pub use config::{
    resolve_default_endpoint, Config, PolicyConfig, DEFAULT_CHANNEL_CAPACITY,
    DEFAULT_COLLECTOR_HOST, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LOG_LEVEL,
    DEFAULT_READ_TIMEOUT_SECS, ENDPOINT_PATH, HOST_OVERRIDE_ENV, HOST_OVERRIDE_PORT,
};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
