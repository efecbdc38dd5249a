//! Login/logout endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use axum_extra::extract::cookie::CookieJar;

use super::MessageResponse;
use crate::auth::{self, SESSION_COOKIE};
use crate::errors::AppError;
use crate::models::{LoginRequest, LoginResponse, LoginStatus};
use crate::AppState;

/// POST /api/login - Check credentials and start a session.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let Some(role) = state
        .credentials
        .verify(&request.username, &request.password)
    else {
        tracing::warn!(username = %request.username, "Login failed");
        return Err(AppError::Unauthorized(
            "invalid username or password".to_string(),
        ));
    };

    let session_id = state.sessions.create(&request.username, role).await;
    tracing::info!(username = %request.username, role = role.as_str(), "Login succeeded");

    let body = LoginResponse {
        success: true,
        message: "Logged in".to_string(),
        role,
    };
    Ok((jar.add(auth::session_cookie(session_id)), Json(body)))
}

/// POST /api/logout - End the current session.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(session) = state.sessions.remove(cookie.value()).await {
            tracing::info!(username = %session.username, "Logged out");
        }
    }

    (
        jar.remove(auth::removal_cookie()),
        Json(MessageResponse::new("Logged out")),
    )
}

/// GET /api/check_login - Report the current session, if any.
pub async fn check_login(State(state): State<AppState>, jar: CookieJar) -> Json<LoginStatus> {
    let status = match auth::current_session(&state, &jar).await {
        Some(session) => LoginStatus {
            logged_in: true,
            role: Some(session.role),
            username: Some(session.username),
            logged_in_at: Some(session.logged_in_at.to_rfc3339()),
        },
        None => LoginStatus::default(),
    };
    Json(status)
}
