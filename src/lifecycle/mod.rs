//! Process lifecycle: bring-up, serving, and teardown.
//!
//! # Data Flow
//! ```text
//! startup.rs:
//!     ConfigStore::open → LogLevelController → logging::init
//!     → ConfigWatcher::spawn → TcpListener::bind → HttpServer::run
//!
//! signals.rs:
//!     SIGINT or SIGTERM → shutdown.rs trigger
//!
//! shutdown.rs:
//!     watcher drain task exits → server drains within quit_max_time
//!     → LogGuard dropped (flushes file sink)
//! ```
//!
//! A bind failure is reported through the panic target and still stops the
//! watcher before returning.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
