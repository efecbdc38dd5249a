//! REST API module.
//!
//! Contains all API routes and handlers used by the browser panel.

mod config;
mod execute;
mod session;
mod subscriptions;

pub use config::*;
pub use execute::*;
pub use session::*;
pub use subscriptions::*;

use axum::{extract::rejection::JsonRejection, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::store::{is_empty_document, Document};

/// Success envelope for mutations.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Unwrap a posted document, rejecting unparsable or empty bodies with 400.
fn posted_document(payload: Result<Json<Document>, JsonRejection>) -> Result<Document, AppError> {
    let Json(doc) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    if is_empty_document(&doc) {
        return Err(AppError::BadRequest("request body is empty".to_string()));
    }
    Ok(doc)
}
