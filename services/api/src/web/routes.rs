//! services/api/src/web/routes.rs
//!
//! Assembles the application router.

use crate::web::{
    auth::{login_handler, logout_handler},
    middleware::{authenticate, authorize, protected_handler, ADMIN_ROLES},
    rest::{
        clear_history_handler, clear_platform_handler, list_history_handler,
        list_platforms_handler, select_platform_handler, session_handler,
        toggle_dark_mode_handler, validate_handler,
    },
    state::AppState,
    ws_handler,
};
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Lookup flow (no bearer token involved)
    let lookup_routes = Router::new()
        .route("/platforms", get(list_platforms_handler))
        .route("/session", get(session_handler))
        .route("/session/login", post(login_handler))
        .route("/session/logout", post(logout_handler))
        .route(
            "/session/platform",
            put(select_platform_handler).delete(clear_platform_handler),
        )
        .route("/session/dark-mode/toggle", post(toggle_dark_mode_handler))
        .route("/validate", post(validate_handler))
        .route("/history", get(list_history_handler).delete(clear_history_handler))
        .route("/ws", get(ws_handler));

    // Independent token-checked boundary; the later layer runs first.
    let protected_routes = Router::new()
        .route("/protected", get(protected_handler))
        .layer(axum_middleware::from_fn_with_state(ADMIN_ROLES, authorize))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            authenticate,
        ));

    Router::new()
        .merge(lookup_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
