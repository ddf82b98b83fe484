//! Process-wide severity threshold.
//!
//! Read on every log record, written only by the config reload path.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::config::store::LevelObserver;
use crate::observability::level::LogLevel;

/// Holds the current [`LogLevel`] in a single atomic byte.
///
/// Readers never block and always see either the old or the new value.
/// Successive writes are last-write-wins.
#[derive(Debug)]
pub struct LogLevelController {
    level: AtomicU8,
}

impl LogLevelController {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: AtomicU8::new(level as u8),
        }
    }

    /// Install the level named by `text`. Unrecognized text installs `info`.
    ///
    /// Returns the level that was installed.
    pub fn set_level(&self, text: &str) -> LogLevel {
        let level = LogLevel::from_config(text);
        let previous = self.store(level);
        if previous != level {
            tracing::info!(from = %previous, to = %level, "log level changed");
        }
        level
    }

    pub fn current_level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Acquire))
    }

    fn store(&self, level: LogLevel) -> LogLevel {
        LogLevel::from_u8(self.level.swap(level as u8, Ordering::AcqRel))
    }
}

impl Default for LogLevelController {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

impl LevelObserver for LogLevelController {
    fn level_changed(&self, level: &str) {
        self.set_level(level);
    }
}
