//! Authoritative configuration snapshot with hot reload.
//!
//! # Concurrency
//! - Readers call [`ConfigStore::current`], a lock-free `ArcSwap` load.
//! - Reloads take the writer mutex for the whole load → swap → notify
//!   sequence, so concurrent file events apply one at a time and the
//!   observer sees levels in the same order snapshots were installed.
//! - Readers never touch the writer mutex.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use notify::Event;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::ConfigSnapshot;

/// Receives the logging severity of every newly installed snapshot.
pub trait LevelObserver: Send + Sync {
    fn level_changed(&self, level: &str);
}

/// Result of handling one file event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A new snapshot was installed and the observer notified.
    Applied,
    /// The file could not be read or parsed; the previous snapshot stays.
    Rejected,
    /// The event did not concern the config file.
    Ignored,
}

#[derive(Default)]
struct Writer {
    observer: Option<Arc<dyn LevelObserver>>,
}

/// Holds the current [`ConfigSnapshot`] for a single config file.
pub struct ConfigStore {
    path: PathBuf,
    current: ArcSwap<ConfigSnapshot>,
    writer: Mutex<Writer>,
}

impl ConfigStore {
    /// Perform the mandatory initial load. Fails if the file cannot be
    /// read, parsed, or validated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let config = load_config(&path)?;
        Ok(Self {
            path,
            current: ArcSwap::from_pointee(config),
            writer: Mutex::new(Writer::default()),
        })
    }

    /// Path of the watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The active snapshot. Never blocks.
    pub fn current(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    /// Register the observer told about the severity of each new snapshot.
    pub fn set_observer(&self, observer: Arc<dyn LevelObserver>) {
        self.lock_writer().observer = Some(observer);
    }

    /// Handle a raw watcher event.
    pub fn on_change(&self, event: &Event) -> ReloadOutcome {
        if !self.is_relevant(event) {
            return ReloadOutcome::Ignored;
        }
        self.reload()
    }

    /// Re-read the file and install it if valid.
    ///
    /// Errors are logged, never returned: a bad edit simply does not take effect.
    pub fn reload(&self) -> ReloadOutcome {
        let writer = self.lock_writer();

        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to reload config, keeping current configuration"
                );
                return ReloadOutcome::Rejected;
            }
        };

        let level = config.zap.level.clone();
        self.current.store(Arc::new(config));
        tracing::info!(path = %self.path.display(), "Configuration reloaded");

        if let Some(observer) = &writer.observer {
            observer.level_changed(&level);
        }
        ReloadOutcome::Applied
    }

    /// Whether `event` is a create/modify of the config file.
    ///
    /// Events without paths are treated as relevant.
    pub fn is_relevant(&self, event: &Event) -> bool {
        if !(event.kind.is_modify() || event.kind.is_create()) {
            return false;
        }
        if event.paths.is_empty() {
            return true;
        }
        let name = self.path.file_name();
        event.paths.iter().any(|p| p.file_name() == name)
    }

    fn lock_writer(&self) -> std::sync::MutexGuard<'_, Writer> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .field("current", &self.current.load())
            .finish_non_exhaustive()
    }
}
