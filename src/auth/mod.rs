//! Session-cookie authentication.
//!
//! Credentials are checked by an injected `CredentialVerifier`; successful
//! logins get a random session id in the `session_id` cookie. The guard
//! middlewares reject anonymous requests with 401 and non-admin sessions on
//! admin routes with 403.

mod credentials;
mod session;

pub use credentials::{CredentialVerifier, Role, StaticCredentials};
pub use session::{Session, SessionStore};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::errors::AppError;
use crate::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session_id";

/// Build the session cookie for a new login.
pub fn session_cookie(id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie value used to clear the session cookie on logout.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Resolve the session referenced by the request's cookie, if any.
pub async fn current_session(state: &AppState, jar: &CookieJar) -> Option<Session> {
    let id = jar.get(SESSION_COOKIE)?.value();
    state.sessions.get(id).await
}

/// Reject requests without a valid session.
pub async fn require_login(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    match current_session(&state, &jar).await {
        Some(_) => next.run(request).await,
        None => AppError::Unauthorized("login required".to_string()).into_response(),
    }
}

/// Reject requests without an admin session.
pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    match current_session(&state, &jar).await {
        Some(session) if session.role == Role::Admin => next.run(request).await,
        Some(session) => {
            tracing::warn!(username = %session.username, path = %request.uri().path(), "Admin route denied");
            AppError::Forbidden("admin role required".to_string()).into_response()
        }
        None => AppError::Unauthorized("login required".to_string()).into_response(),
    }
}
