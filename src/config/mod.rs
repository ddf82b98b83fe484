//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ConfigSnapshot (validated, immutable)
//!     → store.rs holds it behind an ArcSwap, shared via Arc
//!
//! On file change:
//!     watcher.rs receives the notify event
//!     → store.rs reloads on the single writer path
//!     → loader.rs loads new config
//!     → atomic swap of Arc<ConfigSnapshot>
//!     → LevelObserver receives the new zap.level
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - A failed reload leaves the previous snapshot in place
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::ConfigSnapshot;
pub use schema::{LogFormat, LumberjackConfig, RunMode, StorageConfig, SystemConfig, ZapConfig};
pub use store::{ConfigStore, LevelObserver, ReloadOutcome};
pub use watcher::{ConfigWatcher, WatchHandle};
