//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, panic recovery)
//! - Bind server to listener
//! - Bound graceful shutdown by the configured grace period

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::ConfigStore;
use crate::error::AppError;
use crate::http::health::health_handler;
use crate::observability::LogLevelController;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigStore>,
    pub log_level: Arc<LogLevelController>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Arc<ConfigStore>, log_level: Arc<LogLevelController>) -> Self {
        Self {
            config,
            log_level,
            started_at: Instant::now(),
        }
    }
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    config: Arc<ConfigStore>,
}

impl HttpServer {
    /// Create a new HTTP server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = Arc::clone(&state.config);
        Self {
            router: Self::build_router(state),
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(
                        TraceLayer::new_for_http()
                            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                            .on_response(DefaultOnResponse::new().level(Level::INFO)),
                    )
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(CatchPanicLayer::new()),
            )
    }

    /// Serve until `signal` resolves, then drain.
    ///
    /// The grace period is read from the snapshot current when the signal
    /// fires. If in-flight requests outlive it, returns
    /// [`AppError::ShutdownTimeout`] and stops waiting for them.
    pub async fn run<F>(self, listener: TcpListener, signal: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr().map_err(AppError::Serve)?;
        tracing::info!(address = %addr, "HTTP server starting");

        let (draining_tx, draining_rx) = oneshot::channel::<Duration>();
        let config = self.config;
        let graceful = async move {
            signal.await;
            let grace = config.current().system.grace_period();
            tracing::info!(grace_secs = grace.as_secs(), "HTTP server draining");
            let _ = draining_tx.send(grace);
        };

        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(graceful)
            .into_future();

        let deadline = async move {
            match draining_rx.await {
                Ok(grace) => {
                    tokio::time::sleep(grace).await;
                    grace
                }
                Err(_) => std::future::pending().await,
            }
        };

        tokio::select! {
            result = serve => result.map_err(AppError::Serve)?,
            grace = deadline => return Err(AppError::ShutdownTimeout(grace)),
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn store_with(content: &str) -> (tempfile::TempDir, Arc<ConfigStore>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        let store = Arc::new(ConfigStore::open(&path).unwrap());
        (dir, store)
    }

    fn state() -> (tempfile::TempDir, AppState) {
        let (dir, store) =
            store_with("[system]\nmode = \"release\"\n\n[zap]\nlevel = \"warn\"\n");
        let level = Arc::new(LogLevelController::default());
        level.set_level(&store.current().zap.level);
        (dir, AppState::new(store, level))
    }

    #[tokio::test]
    async fn health_reports_live_state() {
        let (_dir, state) = state();
        let router = HttpServer::build_router(state.clone());

        let response = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["mode"], "release");
        assert_eq!(json["log_level"], "warn");

        state.log_level.set_level("error");
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["log_level"], "error");
    }

    #[tokio::test]
    async fn requests_are_logged_at_info() {
        let (_dir, state) = state();
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        let response = HttpServer::build_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let out = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("finished processing request"), "captured: {out}");
        assert!(out.contains("/health"), "captured: {out}");
    }

    #[tokio::test]
    async fn keeps_caller_request_id() {
        let (_dir, state) = state();
        let response = HttpServer::build_router(state)
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (_dir, state) = state();
        let response = HttpServer::build_router(state)
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stops_when_signalled() {
        let (_dir, state) = state();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let server = tokio::spawn(HttpServer::new(state).run(listener, async move {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn in_flight_request_past_grace_period_times_out() {
        let (_dir, config) = store_with("[system]\nquit_max_time = 1\n\n[zap]\n");
        let entered = Arc::new(tokio::sync::Notify::new());
        let handler_entered = Arc::clone(&entered);
        let router = Router::new().route(
            "/slow",
            get(move || {
                let entered = Arc::clone(&handler_entered);
                async move {
                    entered.notify_one();
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    "done"
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(HttpServer { router, config }.run(listener, async move {
            let _ = rx.await;
        }));

        let client = tokio::spawn(reqwest::get(format!("http://{addr}/slow")));
        entered.notified().await;

        let started = Instant::now();
        tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
        let elapsed = started.elapsed();

        let grace = match result {
            Err(AppError::ShutdownTimeout(grace)) => grace,
            other => panic!("expected shutdown timeout, got {other:?}"),
        };
        assert_eq!(grace, Duration::from_secs(1));
        assert!(elapsed >= Duration::from_millis(900), "returned after {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "returned after {elapsed:?}");
        client.abort();
    }
}
