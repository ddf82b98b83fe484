//! Process-level error type.
//!
//! Startup errors abort before the listener opens. Reload errors never reach
//! this type: the config store logs them and keeps the previous snapshot.

use std::net::SocketAddr;
use std::time::Duration;

use crate::config::ConfigError;
use crate::observability::LoggingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] LoggingError),

    #[error("failed to watch configuration file: {0}")]
    Watch(#[from] notify::Error),

    #[error("failed to start server on {addr}: {source}")]
    ServerStart {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("graceful shutdown exceeded {}s grace period", .0.as_secs())]
    ShutdownTimeout(Duration),
}
