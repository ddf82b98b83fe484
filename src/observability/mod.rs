//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events
//!     → logging.rs SeverityGate (checks controller.rs on every record)
//!     → stdout and/or rotation.rs file sink
//!
//! Config reload:
//!     → controller.rs set_level (atomic swap)
//!     → next record sees the new threshold
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - The threshold lives outside the config snapshot so the per-record check
//!   is a single atomic load
//! - Unrecognized level names fall back to info, never fail

pub mod controller;
pub mod level;
pub mod logging;
pub mod rotation;

pub use controller::LogLevelController;
pub use level::{LogLevel, PANIC_TARGET};
pub use logging::{LogGuard, LoggingError};
