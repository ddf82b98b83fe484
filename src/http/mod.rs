//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request id, trace span, panic recovery
//!     → health.rs (GET /health)
//!     → Send to client
//!
//! Shutdown:
//!     signal → stop accepting → drain in-flight (bounded by system.quit_max_time)
//! ```

pub mod health;
pub mod server;

pub use server::{AppState, HttpServer};
