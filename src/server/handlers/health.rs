use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let passages = state.engine.passage_count().await;
    let documents = state.engine.docs().available_files().len();
    let uptime_secs = (chrono::Utc::now() - state.started_at).num_seconds();

    Json(json!({
        "status": "ok",
        "indexed_passages": passages,
        "documents": documents,
        "uptime_secs": uptime_secs,
    }))
}
