//! Configuration file watcher for hot reload.
//!
//! The notify callback only forwards raw events into a channel. A single
//! tokio task drains the channel and runs the reload on the blocking pool,
//! so the store has exactly one writer and file I/O stays off the request
//! workers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::store::{ConfigStore, ReloadOutcome};

/// Quiet period after the first event of a burst before reloading.
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(100);

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    store: Arc<ConfigStore>,
}

/// Keeps the OS watch alive; dropping it stops file notifications.
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Wait for the reload task to exit (it stops on the shutdown broadcast).
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "config watch task failed");
        }
    }
}

impl ConfigWatcher {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// Start watching. Must be called from within a tokio runtime.
    ///
    /// The parent directory is watched rather than the file so that editors
    /// replacing the file by rename keep triggering reloads.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> Result<WatchHandle, notify::Error> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let dir = watch_dir(self.store.path());
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?self.store.path(), "Config watcher started");

        let task = tokio::spawn(drain(self.store, rx, shutdown));
        Ok(WatchHandle {
            _watcher: watcher,
            task,
        })
    }
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

async fn drain(
    store: Arc<ConfigStore>,
    mut events: mpsc::UnboundedReceiver<Event>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let event = tokio::select! {
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
            _ = shutdown.recv() => {
                tracing::debug!("config watcher shutting down");
                break;
            }
        };

        let mut relevant = store.is_relevant(&event);
        if relevant {
            tokio::time::sleep(RELOAD_DEBOUNCE).await;
        }
        while let Ok(next) = events.try_recv() {
            relevant |= store.is_relevant(&next);
        }
        if !relevant {
            continue;
        }

        tracing::info!("Config file change detected, reloading...");
        let writer = Arc::clone(&store);
        match tokio::task::spawn_blocking(move || writer.reload()).await {
            Ok(ReloadOutcome::Applied) => {}
            Ok(outcome) => tracing::debug!(?outcome, "config change not applied"),
            Err(e) => tracing::error!(error = %e, "config reload task failed"),
        }
    }
}
