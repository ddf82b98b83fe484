//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.
//!
//! The `[system]` and `[zap]` tables are mandatory: an empty or truncated
//! file is a parse error, never a snapshot of defaults. Every other table,
//! and every field inside a table, has a default.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// One successfully parsed configuration file.
///
/// Snapshots are never mutated after construction; a reload builds a new one
/// and the store swaps the pointer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigSnapshot {
    /// Server network settings.
    pub system: SystemConfig,

    /// Logger settings (severity, encoding, sinks).
    pub zap: ZapConfig,

    /// Rotation settings for the file sink.
    #[serde(default)]
    pub lumberjack: LumberjackConfig,

    /// Storage connection settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Accepts a port written either as an integer (`8080`) or as a string
/// (`"8080"`).
fn port_number<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("invalid port {text:?}, expected 0-65535"))
        }),
    }
}

/// Server network settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// TCP port to listen on (all interfaces).
    #[serde(deserialize_with = "port_number")]
    pub port: u16,

    /// Operating mode.
    pub mode: RunMode,

    /// Graceful shutdown grace period in seconds.
    pub quit_max_time: u64,
}

impl SystemConfig {
    /// Address the HTTP listener binds to.
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    /// How long in-flight requests may run after a shutdown signal.
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.quit_max_time)
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            mode: RunMode::Debug,
            quit_max_time: 5,
        }
    }
}

/// Operating mode of the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Debug,
    Release,
    Test,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Debug => "debug",
            RunMode::Release => "release",
            RunMode::Test => "test",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logger settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ZapConfig {
    /// Minimum severity (debug, info, warn, error, panic).
    /// Unrecognized values fall back to info.
    pub level: String,

    /// Record encoding: "json" or "console". Anything else is json.
    pub format: String,

    /// Level rendering. The `*Color*` variants enable ANSI colour on stdout.
    pub encode_level: String,

    /// Include the call site (file:line) in every record.
    pub show_line: bool,

    /// Write records to stdout.
    pub log_in_console: bool,

    /// Write records to the rotated file.
    pub log_in_file: bool,
}

impl ZapConfig {
    pub fn log_format(&self) -> LogFormat {
        if self.format.eq_ignore_ascii_case("console") {
            LogFormat::Console
        } else {
            LogFormat::Json
        }
    }

    pub fn colored(&self) -> bool {
        matches!(
            self.encode_level.as_str(),
            "LowercaseColorLevelEncoder" | "CapitalColorLevelEncoder"
        )
    }
}

impl Default for ZapConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "console".to_string(),
            encode_level: "LowercaseLevelEncoder".to_string(),
            show_line: false,
            log_in_console: true,
            log_in_file: false,
        }
    }
}

/// Record encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Machine-parseable, one JSON object per line.
    Json,
    /// Human-readable single line.
    Console,
}

/// Rotation settings for the file sink.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LumberjackConfig {
    /// Path of the active log file.
    pub filename: String,

    /// Size in megabytes at which the file is rotated (0 means 100).
    pub max_size: u64,

    /// Number of rotated files to keep (0 keeps all).
    pub max_backups: usize,

    /// Days to keep rotated files (0 keeps them forever).
    pub max_age: u32,

    /// Gzip rotated files.
    pub compress: bool,
}

impl Default for LumberjackConfig {
    fn default() -> Self {
        Self {
            filename: "logs/app.log".to_string(),
            max_size: 100,
            max_backups: 5,
            max_age: 30,
            compress: false,
        }
    }
}

/// Storage connection settings. Carried for consumers; no connection is
/// opened by the service itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub mysql: MysqlConfig,
    pub redis: RedisConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MysqlConfig {
    pub ip: String,
    #[serde(deserialize_with = "port_number")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl MysqlConfig {
    /// Connection string in `user:password@tcp(host:port)/db?params` form.
    pub fn dsn(&self) -> String {
        format!(
            "{}:{}@tcp({}:{})/{}?charset=utf8&parseTime=True&loc=Local",
            self.user, self.password, self.ip, self.port, self.database
        )
    }
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisConfig {
    pub addr: String,
    pub password: String,
    pub db: u32,
}

impl RedisConfig {
    pub fn url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}/{}", self.addr, self.db)
        } else {
            format!("redis://:{}@{}/{}", self.password, self.addr, self.db)
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:6379".to_string(),
            password: String::new(),
            db: 0,
        }
    }
}
