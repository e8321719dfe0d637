//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::auth::{self, LoginRequest, LoginResponse};
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use lookup_core::{PlatformId, PortError, PLATFORMS};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_platforms_handler,
        session_handler,
        select_platform_handler,
        clear_platform_handler,
        toggle_dark_mode_handler,
        validate_handler,
        list_history_handler,
        clear_history_handler,
        auth::login_handler,
        auth::logout_handler,
    ),
    components(
        schemas(
            PlatformView,
            SessionView,
            SelectPlatformRequest,
            DarkModeResponse,
            ValidateRequest,
            ValidateResponse,
            LoginRequest,
            LoginResponse,
        )
    ),
    tags(
        (name = "Username Lookup API", description = "API endpoints for the username lookup tool.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// One entry of the platform picker.
#[derive(Serialize, ToSchema)]
pub struct PlatformView {
    id: String,
    name: String,
    color: String,
}

/// The persisted session flags.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    is_logged_in: bool,
    selected_platform: Option<String>,
    dark_mode: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct SelectPlatformRequest {
    pub platform: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DarkModeResponse {
    dark_mode: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct ValidateRequest {
    pub username: String,
}

#[derive(Serialize, ToSchema)]
pub struct ValidateResponse {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Maps a port failure to a response, logging the cause.
fn port_failure(e: PortError, action: &str) -> (StatusCode, String) {
    match e {
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Not logged in".to_string()),
        PortError::NotFound(what) => (StatusCode::NOT_FOUND, what),
        other => {
            error!("Failed to {}: {:?}", action, other);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to {}", action))
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the platforms a lookup can target.
#[utoipa::path(
    get,
    path = "/platforms",
    responses((status = 200, description = "Platform catalog", body = [PlatformView]))
)]
pub async fn list_platforms_handler() -> Json<Vec<PlatformView>> {
    Json(
        PLATFORMS
            .iter()
            .map(|info| PlatformView {
                id: info.id.to_string(),
                name: info.name.to_string(),
                color: info.color.to_string(),
            })
            .collect(),
    )
}

/// Read the persisted session flags.
#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Current session flags", body = SessionView),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn session_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let snapshot = app_state
        .preferences
        .snapshot()
        .await
        .map_err(|e| port_failure(e, "read session"))?;

    Ok(Json(SessionView {
        is_logged_in: snapshot.is_logged_in,
        selected_platform: snapshot.selected_platform.map(|p| p.to_string()),
        dark_mode: snapshot.dark_mode,
    }))
}

/// Pick the platform subsequent searches run against.
#[utoipa::path(
    put,
    path = "/session/platform",
    request_body = SelectPlatformRequest,
    responses(
        (status = 204, description = "Platform selected"),
        (status = 400, description = "Unknown platform"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn select_platform_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<SelectPlatformRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let platform: PlatformId = req
        .platform
        .parse()
        .map_err(|e: lookup_core::domain::UnknownPlatform| (StatusCode::BAD_REQUEST, e.to_string()))?;

    app_state
        .preferences
        .select_platform(platform)
        .await
        .map_err(|e| port_failure(e, "select platform"))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Go back to the platform picker.
#[utoipa::path(
    delete,
    path = "/session/platform",
    responses((status = 204, description = "Selection cleared"))
)]
pub async fn clear_platform_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .preferences
        .clear_platform()
        .await
        .map_err(|e| port_failure(e, "clear platform"))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flip the theme flag.
#[utoipa::path(
    post,
    path = "/session/dark-mode/toggle",
    responses((status = 200, description = "New theme flag", body = DarkModeResponse))
)]
pub async fn toggle_dark_mode_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<DarkModeResponse>, (StatusCode, String)> {
    let dark_mode = app_state
        .preferences
        .toggle_dark_mode()
        .await
        .map_err(|e| port_failure(e, "toggle dark mode"))?;
    Ok(Json(DarkModeResponse { dark_mode }))
}

/// Check a username the way the search box does before submitting.
#[utoipa::path(
    post,
    path = "/validate",
    request_body = ValidateRequest,
    responses((status = 200, description = "Validation verdict", body = ValidateResponse))
)]
pub async fn validate_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<ValidateRequest>,
) -> Json<ValidateResponse> {
    let verdict = app_state.config.validation.validate(&req.username);
    Json(ValidateResponse {
        valid: verdict.is_ok(),
        message: verdict.err().map(|e| e.to_string()),
    })
}

/// List past searches, newest first.
#[utoipa::path(
    get,
    path = "/history",
    responses(
        (status = 200, description = "Search history, newest first"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_history_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entries = app_state
        .history
        .all()
        .await
        .map_err(|e| port_failure(e, "load history"))?;
    Ok(Json(entries))
}

/// Forget every past search.
#[utoipa::path(
    delete,
    path = "/history",
    responses((status = 204, description = "History cleared"))
)]
pub async fn clear_history_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .history
        .clear()
        .await
        .map_err(|e| port_failure(e, "clear history"))?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::web::test_support::{serve, test_state};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn login_then_pick_platform() {
        let base = serve(test_state().await).await;
        let client = reqwest::Client::new();

        let resp = client
            .put(format!("{}/session/platform", base))
            .json(&json!({ "platform": "telegram" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 401);

        let resp = client
            .post(format!("{}/session/login", base))
            .json(&json!({ "username": "admin", "password": "wrong" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 401);

        let resp = client
            .post(format!("{}/session/login", base))
            .json(&json!({ "username": "admin", "password": "admin" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);

        let resp = client
            .put(format!("{}/session/platform", base))
            .json(&json!({ "platform": "myspace" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);

        let resp = client
            .put(format!("{}/session/platform", base))
            .json(&json!({ "platform": "instagram" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 204);

        let session: Value = client
            .get(format!("{}/session", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(session, json!({ "isLoggedIn": true, "selectedPlatform": "instagram", "darkMode": false }));

        client.post(format!("{}/session/logout", base)).send().await.unwrap();
        let session: Value = client
            .get(format!("{}/session", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(session["isLoggedIn"], false);
        assert!(session["selectedPlatform"].is_null());
    }

    #[tokio::test]
    async fn validate_reports_inline_messages() {
        let base = serve(test_state().await).await;
        let client = reqwest::Client::new();

        let verdict: Value = client
            .post(format!("{}/validate", base))
            .json(&json!({ "username": "abc" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(verdict, json!({ "valid": false, "message": "username must start with @" }));

        let verdict: Value = client
            .post(format!("{}/validate", base))
            .json(&json!({ "username": "@ab" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(verdict, json!({ "valid": true }));
    }

    #[tokio::test]
    async fn history_lists_and_clears() {
        let state = test_state().await;
        let pipeline = state.new_pipeline(lookup_core::PlatformId::Telegram);
        pipeline.submit("@history_probe").unwrap().await.unwrap().unwrap();

        let base = serve(state).await;
        let client = reqwest::Client::new();

        let history: Value = client
            .get(format!("{}/history", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(history.as_array().unwrap().len(), 1);
        assert_eq!(history[0]["username"], "@history_probe");
        assert_eq!(history[0]["platform"], "telegram");

        let resp = client.delete(format!("{}/history", base)).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 204);
        let history: Value = client
            .get(format!("{}/history", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(history, json!([]));
    }

    #[tokio::test]
    async fn platforms_are_listed_in_order() {
        let base = serve(test_state().await).await;
        let platforms: Value = reqwest::get(format!("{}/platforms", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let ids: Vec<&str> = platforms
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["telegram", "instagram", "linkedin", "facebook"]);
    }
}
