//! services/api/src/web/auth.rs
//!
//! Login gate endpoints. The credential check is a fixed literal pair; the
//! result is the persisted `isLoggedIn` flag, not a server-side session.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use lookup_core::{Credentials, PortError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub username: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /session/login - Log in with the built-in credentials
#[utoipa::path(
    post,
    path = "/session/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let credentials = Credentials {
        username: req.username,
        password: req.password,
    };

    match state.preferences.login(&credentials).await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(LoginResponse { username: credentials.username }),
        )),
        Err(PortError::Unauthorized) => Err((
            StatusCode::UNAUTHORIZED,
            "نام کاربری یا رمز عبور اشتباه است".to_string(),
        )),
        Err(e) => {
            error!("Failed to record login: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to log in".to_string()))
        }
    }
}

/// POST /session/logout - Log out and forget the selected platform
#[utoipa::path(
    post,
    path = "/session/logout",
    responses(
        (status = 204, description = "Logout successful"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state.preferences.logout().await.map_err(|e| {
        error!("Failed to log out: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout".to_string())
    })?;

    Ok(StatusCode::NO_CONTENT)
}
