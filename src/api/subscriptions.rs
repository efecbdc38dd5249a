//! Subscriptions (subscriptions.json) API endpoints.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::{posted_document, MessageResponse};
use crate::errors::AppError;
use crate::models::{SubscriptionDocument, ValidationReport};
use crate::store::Document;
use crate::AppState;

/// GET /api/subscriptions - Load the subscriptions document.
pub async fn get_subscriptions(State(state): State<AppState>) -> Result<Json<Document>, AppError> {
    let doc = state.subscription_store.load().await?;
    Ok(Json(doc))
}

/// POST /api/subscriptions - Replace the subscriptions document.
pub async fn update_subscriptions(
    State(state): State<AppState>,
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let doc = posted_document(payload)?;

    let _guard = state.subscriptions_lock.lock().await;
    let outcome = state.subscription_store.save(&doc).await?;

    Ok(Json(MessageResponse::new(outcome.message)))
}

/// POST /api/subscriptions/validate - Check a document without saving it.
pub async fn validate_subscriptions(
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<Json<ValidationReport>, AppError> {
    let doc = posted_document(payload)?;

    let parsed: SubscriptionDocument = serde_json::from_value(doc)
        .map_err(|e| AppError::BadRequest(format!("invalid subscriptions document: {}", e)))?;

    Ok(Json(ValidationReport::from(parsed.validate())))
}
