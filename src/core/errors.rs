use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failures inside the retrieval/response pipeline.
///
/// Each variant maps to a named degradation point: only `Embedding` during
/// startup model probing is allowed to abort the process, everything else
/// degrades to a default value at the stage where it occurs.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to parse document '{file}': {reason}")]
    Parse { file: String, reason: String },
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("index persistence failed: {0}")]
    Persistence(String),
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("translation failed: {0}")]
    Translation(String),
}

impl EngineError {
    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        EngineError::Embedding(err.to_string())
    }

    pub fn persistence<E: std::fmt::Display>(err: E) -> Self {
        EngineError::Persistence(err.to_string())
    }

    pub fn generation<E: std::fmt::Display>(err: E) -> Self {
        EngineError::Generation(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Parse { .. } => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
