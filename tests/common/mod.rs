//! Shared utilities for integration tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// A complete config file with the given port and level.
pub fn config_toml(port: u16, level: &str) -> String {
    format!(
        r#"[system]
port = {port}
mode = "release"
quit_max_time = 2

[zap]
level = "{level}"
format = "json"
log_in_console = true

[storage.mysql]
database = "db-{port}"
"#
    )
}

/// Write `content` to `config.toml` in `dir` and return its path.
pub fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

/// Poll `check` until it returns true or `timeout` elapses.
#[allow(dead_code)]
pub async fn eventually<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    check()
}
