//! `GET /health` handler.
//!
//! Reads the live snapshot and threshold, so a successful reload is visible
//! here without restarting.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub mode: &'static str,
    pub log_level: &'static str,
    pub uptime_secs: u64,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    let config = state.config.current();
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        mode: config.system.mode.as_str(),
        log_level: state.log_level.current_level().as_str(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
