//! Size-rotated log file.
//!
//! # Responsibilities
//! - Map `[lumberjack]` settings onto a `file-rotate` writer
//! - Surface an unwritable log path as an error at startup
//! - Drop backups older than `max_age` when the file is opened
//!
//! Rotated files are named `<file name>.<timestamp>[.<n>][.gz]`. Two
//! rotations within the same second get distinct numeric suffixes.
//!
//! While running, `file-rotate` enforces one file limit: `max_backups` when
//! set, otherwise `max_age`. With both set, the age limit is applied each
//! time the file is opened.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use file_rotate::compression::Compression;
use file_rotate::suffix::{AppendTimestamp, FileLimit};
use file_rotate::{ContentLimit, FileRotate};

use crate::config::LumberjackConfig;

const MEGABYTE: u64 = 1024 * 1024;
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Limits applied by [`RotatingFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    /// 0 keeps every backup.
    pub max_backups: usize,
    /// 0 disables age pruning.
    pub max_age_days: u32,
    pub compress: bool,
}

impl From<&LumberjackConfig> for RotationPolicy {
    fn from(config: &LumberjackConfig) -> Self {
        let max_size = if config.max_size == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            config.max_size
        };
        Self {
            max_bytes: max_size.saturating_mul(MEGABYTE),
            max_backups: config.max_backups,
            max_age_days: config.max_age,
            compress: config.compress,
        }
    }
}

impl RotationPolicy {
    fn file_limit(&self) -> FileLimit {
        if self.max_backups > 0 {
            FileLimit::MaxFiles(self.max_backups)
        } else if self.max_age_days > 0 {
            FileLimit::Age(chrono::Duration::days(i64::from(self.max_age_days)))
        } else {
            FileLimit::Unlimited
        }
    }

    fn content_limit(&self) -> ContentLimit {
        let bytes = usize::try_from(self.max_bytes).unwrap_or(usize::MAX);
        ContentLimit::BytesSurpassed(bytes)
    }

    fn compression(&self) -> Compression {
        if self.compress {
            Compression::OnRotate(0)
        } else {
            Compression::None
        }
    }

    fn max_age(&self) -> Option<Duration> {
        (self.max_age_days > 0)
            .then(|| Duration::from_secs(u64::from(self.max_age_days) * SECONDS_PER_DAY))
    }
}

/// An append-only file that rotates itself by size.
pub struct RotatingFile {
    inner: FileRotate<AppendTimestamp>,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&path)?;

        if let Some(max_age) = policy.max_age() {
            remove_expired(&path, max_age)?;
        }

        let inner = FileRotate::new(
            &path,
            AppendTimestamp::default(policy.file_limit()),
            policy.content_limit(),
            policy.compression(),
            #[cfg(unix)]
            None,
        );
        Ok(Self { inner })
    }
}

impl std::fmt::Debug for RotatingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFile").finish_non_exhaustive()
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Rotated siblings of `path`, whatever their suffix.
fn backups(path: &Path) -> io::Result<Vec<PathBuf>> {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Ok(Vec::new());
    };
    let prefix = format!("{name}.");
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("."),
    };

    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_backup = entry.file_name().to_string_lossy().starts_with(&prefix);
        if is_backup && entry.file_type()?.is_file() {
            found.push(entry.path());
        }
    }
    Ok(found)
}

fn remove_expired(path: &Path, max_age: Duration) -> io::Result<()> {
    let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
        return Ok(());
    };
    for backup in backups(path)? {
        if fs::metadata(&backup)?.modified()? < cutoff {
            fs::remove_file(&backup)?;
        }
    }
    Ok(())
}
