//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging with the configured threshold
//! - Start the config watcher
//! - Bind the listener and serve until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)
//! - The log guard outlives everything else so buffered records are flushed
//!   on every exit path

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::cli::Cli;
use crate::config::{ConfigStore, ConfigWatcher};
use crate::error::AppError;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, LogLevel, LogLevelController, PANIC_TARGET};

/// Run the service until it is signalled to stop.
pub async fn run(cli: Cli) -> Result<(), AppError> {
    let store = Arc::new(ConfigStore::open(&cli.conf)?);
    let snapshot = store.current();

    let log_level = Arc::new(LogLevelController::new(LogLevel::Info));
    let log_guard = logging::init(&snapshot, Arc::clone(&log_level))?;
    logging::install_panic_hook();
    log_level.set_level(&snapshot.zap.level);
    store.set_observer(log_level.clone());

    tracing::info!(
        path = %cli.conf.display(),
        port = snapshot.system.port,
        mode = %snapshot.system.mode,
        level = %log_level.current_level(),
        format = ?snapshot.zap.log_format(),
        file_sink = log_guard.has_file_sink(),
        "Configuration loaded"
    );

    let result = serve(store, log_level).await;
    match &result {
        Ok(()) => tracing::info!("Shutdown complete"),
        Err(AppError::ShutdownTimeout(grace)) => {
            tracing::error!(grace_secs = grace.as_secs(), "failed to shutdown server in time")
        }
        Err(AppError::ServerStart { addr, source }) => {
            tracing::error!(
                target: PANIC_TARGET,
                address = %addr,
                error = %source,
                "failed to start server"
            )
        }
        Err(e) => tracing::error!(error = %e, "server exited with error"),
    }

    drop(log_guard);
    result
}

async fn serve(
    store: Arc<ConfigStore>,
    log_level: Arc<LogLevelController>,
) -> Result<(), AppError> {
    let shutdown = Shutdown::new();
    let watch = ConfigWatcher::new(Arc::clone(&store)).spawn(shutdown.subscribe())?;

    let addr = store.current().system.bind_address();
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(source) => {
            shutdown.trigger();
            watch.join().await;
            return Err(AppError::ServerStart { addr, source });
        }
    };

    let server = HttpServer::new(AppState::new(store, log_level));
    let trigger = shutdown.clone();
    let result = server
        .run(listener, async move {
            signals::shutdown_signal().await;
            trigger.trigger();
        })
        .await;

    shutdown.trigger();
    watch.join().await;
    result
}
