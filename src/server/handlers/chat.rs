use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RespondRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub source_lang: String,
}

/// Full pipeline: rules first, retrieval + generation on a miss.
pub async fn respond(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RespondRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Text field is required".to_string()));
    }

    tracing::info!("Generating response for user input");
    let response = state
        .engine
        .respond(&payload.text, &payload.source_lang)
        .await;

    Ok(Json(json!({ "response": response })))
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub query: String,
    pub k: Option<usize>,
}

/// Extractive mode: top passage only, no generation backend involved.
pub async fn answer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.query.trim().is_empty() {
        return Err(ApiError::BadRequest("Query field is required".to_string()));
    }

    let k = payload.k.unwrap_or(state.settings.retrieval.default_k);
    let response = state.engine.answer(&payload.query, k).await?;
    Ok(Json(json!({ "response": response })))
}

pub async fn clear_data(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Clearing indexed data");
    state.engine.reset().await;
    Ok(Json(json!({ "message": "Data cleared" })))
}
