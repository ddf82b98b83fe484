//! The HTTP server over a real socket.

use std::sync::Arc;
use std::time::Duration;

use scaffolding::config::ConfigStore;
use scaffolding::http::{AppState, HttpServer};
use scaffolding::observability::LogLevelController;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

mod common;

#[tokio::test]
async fn health_reflects_reload_and_server_drains() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_config(dir.path(), &common::config_toml(9401, "warn"));

    let store = Arc::new(ConfigStore::open(&path).unwrap());
    let level = Arc::new(LogLevelController::default());
    level.set_level(&store.current().zap.level);
    store.set_observer(level.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = HttpServer::new(AppState::new(Arc::clone(&store), level));
    let handle = tokio::spawn(server.run(listener, async move {
        let _ = stop_rx.await;
    }));

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();
    let url = format!("http://{addr}/health");

    let body: serde_json::Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["mode"], "release");
    assert_eq!(body["log_level"], "warn");

    std::fs::write(&path, common::config_toml(9401, "Error")).unwrap();
    store.reload();

    let body: serde_json::Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["log_level"], "error");

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
