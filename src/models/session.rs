//! Login request/response bodies.

use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Request body for `POST /api/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub role: Role,
}

/// Response body for `GET /api/check_login`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct LoginStatus {
    pub logged_in: bool,
    pub role: Option<Role>,
    pub username: Option<String>,
    /// RFC 3339 timestamp of the login
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logged_in_at: Option<String>,
}
