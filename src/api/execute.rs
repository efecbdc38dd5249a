//! Push process trigger endpoint.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::runner::RunOutput;
use crate::AppState;

/// POST /api/execute - Run the push process and return its output.
///
/// A non-zero exit is still a 200 with `success: false`.
pub async fn execute(State(state): State<AppState>) -> Result<Json<RunOutput>, AppError> {
    let runner = state
        .runner
        .as_ref()
        .ok_or_else(|| AppError::NotFound("no push command configured".to_string()))?;

    let output = runner.run().await?;
    Ok(Json(output))
}
