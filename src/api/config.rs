//! Settings (config.yaml) API endpoints.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::{posted_document, MessageResponse};
use crate::errors::AppError;
use crate::store::Document;
use crate::AppState;

/// GET /api/config - Load the settings document.
pub async fn get_config(State(state): State<AppState>) -> Result<Json<Document>, AppError> {
    let doc = state.config_store.load().await?;
    Ok(Json(doc))
}

/// POST /api/config - Replace the settings document.
pub async fn update_config(
    State(state): State<AppState>,
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let doc = posted_document(payload)?;

    let _guard = state.config_lock.lock().await;
    let outcome = state.config_store.save(&doc).await?;

    Ok(Json(MessageResponse::new(outcome.message)))
}
