use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let documents = state.engine.docs().all_files();
    Ok(Json(json!({ "documents": documents })))
}

/// Upload a document. The store holds one document set at a time: previous
/// files are removed and the index is reset before the new file is indexed.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut uploaded: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(|name| name.to_string())
            .ok_or_else(|| ApiError::BadRequest("File field needs a filename".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::BadRequest(err.to_string()))?;
        uploaded = Some((filename, bytes.to_vec()));
    }

    let (filename, bytes) =
        uploaded.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;

    tracing::info!("Replacing document set with upload: {}", filename);
    state.engine.docs().replace_with(&filename, &bytes)?;

    // The old passages belong to the old document set; purge before reindex.
    state.engine.reset().await;
    let indexed = state.engine.ingest_all().await.map_err(ApiError::from)?;

    Ok(Json(json!({
        "message": format!(
            "'{}' uploaded, previous documents cleared and indexed.",
            filename
        ),
        "indexed_passages": indexed,
    })))
}
