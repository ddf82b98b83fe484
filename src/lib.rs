//! HTTP service scaffold with hot-reloaded configuration.
//!
//! The configuration file is loaded once at startup and watched for
//! changes. Every valid edit atomically replaces the active snapshot and
//! pushes the new log severity into the live logger; invalid edits are
//! logged and ignored.

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::{ConfigSnapshot, ConfigStore};
pub use error::AppError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::{LogLevel, LogLevelController};
