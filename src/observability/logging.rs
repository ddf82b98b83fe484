//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem from the `[zap]` and `[lumberjack]` tables
//! - Gate every record on the live [`LogLevelController`] threshold
//! - Report process panics at panic severity
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, single-line human format for development
//! - Sinks and encodings are fixed at startup; only the threshold reloads
//! - The gate answers `Interest::sometimes` so cached callsite interest never
//!   outlives a level change

use std::sync::Arc;

use tracing::subscriber::Interest;
use tracing::Metadata;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, time::ChronoLocal, MakeWriter};
use tracing_subscriber::layer::{Context, Filter, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{Layer, Registry};

use crate::config::{ConfigSnapshot, LogFormat, ZapConfig};
use crate::observability::controller::LogLevelController;
use crate::observability::level::PANIC_TARGET;
use crate::observability::rotation::{RotatingFile, RotationPolicy};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install logger: {0}")]
    Init(#[from] TryInitError),
}

/// Keeps the file sink's background writer alive. Dropping it flushes
/// whatever is still buffered.
#[must_use = "dropping the guard stops and flushes the file writer"]
#[derive(Debug, Default)]
pub struct LogGuard {
    file: Option<WorkerGuard>,
}

impl LogGuard {
    pub fn has_file_sink(&self) -> bool {
        self.file.is_some()
    }
}

/// Per-layer filter consulting the live threshold on every record.
#[derive(Debug, Clone)]
pub struct SeverityGate {
    controller: Arc<LogLevelController>,
}

impl SeverityGate {
    pub fn new(controller: Arc<LogLevelController>) -> Self {
        Self { controller }
    }
}

impl<S> Filter<S> for SeverityGate {
    fn enabled(&self, metadata: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        if metadata.is_span() {
            return true;
        }
        self.controller.current_level().allows(metadata)
    }

    fn callsite_enabled(&self, _metadata: &'static Metadata<'static>) -> Interest {
        Interest::sometimes()
    }

    fn max_level_hint(&self) -> Option<LevelFilter> {
        None
    }
}

/// Install the global subscriber described by `config`.
pub fn init(
    config: &ConfigSnapshot,
    controller: Arc<LogLevelController>,
) -> Result<LogGuard, LoggingError> {
    let (layers, guard) = build_layers(config, controller)?;
    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(guard)
}

/// Build one gated layer per configured sink.
///
/// Stdout is used when `log_in_console` is set or when no sink is enabled.
pub fn build_layers(
    config: &ConfigSnapshot,
    controller: Arc<LogLevelController>,
) -> Result<(Vec<BoxedLayer>, LogGuard), LoggingError> {
    let zap = &config.zap;
    let mut layers = Vec::new();
    let mut guard = LogGuard::default();

    if zap.log_in_file {
        let path = &config.lumberjack.filename;
        let policy = RotationPolicy::from(&config.lumberjack);
        let file = RotatingFile::open(path, policy).map_err(|source| LoggingError::OpenFile {
            path: path.clone(),
            source,
        })?;
        let (writer, worker) = tracing_appender::non_blocking(file);
        guard.file = Some(worker);
        layers.push(sink_layer(zap, writer, false, Arc::clone(&controller)));
    }

    if zap.log_in_console || !zap.log_in_file {
        layers.push(sink_layer(zap, std::io::stdout, zap.colored(), controller));
    }

    Ok((layers, guard))
}

/// A formatting layer for one sink, wrapped in the severity gate.
pub fn sink_layer<W>(
    zap: &ZapConfig,
    writer: W,
    ansi: bool,
    controller: Arc<LogLevelController>,
) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let gate = SeverityGate::new(controller);
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_file(zap.show_line)
        .with_line_number(zap.show_line);

    match zap.log_format() {
        LogFormat::Json => layer.json().with_filter(gate).boxed(),
        LogFormat::Console => layer.with_filter(gate).boxed(),
    }
}

/// Route process panics through the logger at panic severity, then run the
/// previously installed hook.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::error!(target: PANIC_TARGET, location = %location, "{payload}");
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::level::LogLevel;
    use std::io;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(
        zap: &ZapConfig,
        controller: &Arc<LogLevelController>,
    ) -> (Buffer, impl tracing::Subscriber + Send + Sync) {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let layer = sink_layer(zap, move || writer.clone(), false, Arc::clone(controller));
        (buffer, tracing_subscriber::registry().with(layer))
    }

    #[test]
    fn threshold_changes_take_effect_immediately() {
        let controller = Arc::new(LogLevelController::new(LogLevel::Warn));
        let (buffer, subscriber) = capture(&ZapConfig::default(), &controller);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("hidden-info");
            tracing::warn!("shown-warn");

            controller.set_level("debug");
            tracing::debug!("shown-debug");

            controller.set_level("error");
            tracing::warn!("hidden-warn");
            tracing::error!("shown-error");
        });

        let out = buffer.contents();
        assert!(!out.contains("hidden-info"));
        assert!(out.contains("shown-warn"));
        assert!(out.contains("shown-debug"));
        assert!(!out.contains("hidden-warn"));
        assert!(out.contains("shown-error"));
    }

    #[test]
    fn panic_threshold_only_passes_panic_target() {
        let controller = Arc::new(LogLevelController::new(LogLevel::Panic));
        let (buffer, subscriber) = capture(&ZapConfig::default(), &controller);

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("plain-error");
            tracing::error!(target: PANIC_TARGET, "fatal-error");
        });

        let out = buffer.contents();
        assert!(!out.contains("plain-error"));
        assert!(out.contains("fatal-error"));
    }

    #[test]
    fn unrecognized_level_is_reported_once_through_the_gate() {
        let controller = Arc::new(LogLevelController::new(LogLevel::Debug));
        let (buffer, subscriber) = capture(&ZapConfig::default(), &controller);

        tracing::subscriber::with_default(subscriber, || {
            assert_eq!(controller.set_level("verbose"), LogLevel::Info);
        });

        let out = buffer.contents();
        assert_eq!(out.matches("falling back to info").count(), 1);
        assert!(out.contains("verbose"));
        assert!(out.contains("log level changed"));
    }

    #[test]
    fn json_format_emits_objects() {
        let controller = Arc::new(LogLevelController::default());
        let zap = ZapConfig {
            format: "json".into(),
            show_line: true,
            ..ZapConfig::default()
        };
        let (buffer, subscriber) = capture(&zap, &controller);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(port = 8080, "listening");
        });

        let out = buffer.contents();
        let line = out.lines().next().unwrap();
        let record: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(record["level"], "INFO");
        assert_eq!(record["fields"]["message"], "listening");
        assert_eq!(record["fields"]["port"], 8080);
        assert!(record["line_number"].is_number());
    }

    #[test]
    fn file_sink_writes_through_guard() {
        let dir = tempfile::tempdir().unwrap();
        let mut config: ConfigSnapshot = toml::from_str("[system]\n[zap]\n").unwrap();
        config.zap.log_in_file = true;
        config.zap.log_in_console = false;
        config.lumberjack.filename = dir.path().join("logs/app.log").display().to_string();

        let controller = Arc::new(LogLevelController::default());
        let (layers, guard) = build_layers(&config, controller).unwrap();
        assert_eq!(layers.len(), 1);

        let subscriber = tracing_subscriber::registry().with(layers);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("to-the-file");
        });
        drop(guard);

        let written = std::fs::read_to_string(dir.path().join("logs/app.log")).unwrap();
        assert!(written.contains("to-the-file"));
    }

    #[test]
    fn console_is_the_fallback_sink() {
        let mut config: ConfigSnapshot = toml::from_str("[system]\n[zap]\n").unwrap();
        config.zap.log_in_console = false;
        config.zap.log_in_file = false;

        let controller = Arc::new(LogLevelController::default());
        let (layers, _guard) = build_layers(&config, controller).unwrap();
        assert_eq!(layers.len(), 1);
    }
}
