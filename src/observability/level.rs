//! Log severities.
//!
//! `tracing` has no level above ERROR, so panic-severity records are ERROR
//! events emitted with target [`PANIC_TARGET`].

use std::str::FromStr;

use tracing::{Level, Metadata};

/// Target carried by panic-severity records.
pub const PANIC_TARGET: &str = "panic";

/// Ordered severity threshold: Debug < Info < Warn < Error < Panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    Panic = 4,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Panic,
    ];

    /// Lenient parse used for configuration values: anything unrecognized is
    /// `Info`, with a warning naming the rejected text.
    pub fn from_config(text: &str) -> Self {
        text.parse().unwrap_or_else(|e: ParseLevelError| {
            tracing::warn!(error = %e, "falling back to info");
            LogLevel::Info
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Panic => "panic",
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LogLevel::Debug,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            4 => LogLevel::Panic,
            _ => LogLevel::Info,
        }
    }

    /// Severity of a `tracing` record.
    pub fn of_record(metadata: &Metadata<'_>) -> Self {
        let level = *metadata.level();
        if level == Level::ERROR {
            if metadata.target() == PANIC_TARGET {
                LogLevel::Panic
            } else {
                LogLevel::Error
            }
        } else if level == Level::WARN {
            LogLevel::Warn
        } else if level == Level::INFO {
            LogLevel::Info
        } else {
            LogLevel::Debug
        }
    }

    /// Whether a record passes this threshold.
    pub fn allows(&self, metadata: &Metadata<'_>) -> bool {
        LogLevel::of_record(metadata) >= *self
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized log level '{0}'")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|level| s.eq_ignore_ascii_case(level.as_str()))
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}
