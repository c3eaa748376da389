use axum::{extract::DefaultBodyLimit, extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::{config::Config, AppState};

pub mod report;

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    max_upload_mb: usize,
}

pub fn build_router(config: Config) -> Router {
    let body_limit = config.max_upload_bytes;
    let state = Arc::new(AppState::new(config));

    Router::new()
        .route("/health", get(health_check))
        .merge(report::routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        max_upload_mb: state.config.max_upload_bytes / (1024 * 1024),
    })
}
