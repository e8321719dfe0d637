//! services/api/src/web/middleware.rs
//!
//! Bearer-token middleware for the protected routes. This boundary is
//! independent of the lookup flow: nothing in the search path calls it.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Extension,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;

pub const NO_TOKEN: &str = "Access denied. No token provided.";
pub const INVALID_TOKEN: &str = "Invalid token.";
pub const FORBIDDEN: &str = "Access denied. You do not have permission.";

/// Roles allowed through `GET /protected`.
pub const ADMIN_ROLES: AllowedRoles = AllowedRoles(&["admin"]);

/// The decoded token payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    #[serde(default)]
    pub name: String,
    pub role: String,
    /// Checked when present; tokens without an expiry are accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct AllowedRoles(pub &'static [&'static str]);

impl AllowedRoles {
    pub fn permits(&self, role: &str) -> bool {
        self.0.iter().any(|allowed| *allowed == role)
    }
}

/// Verifies the `Authorization` header value against the shared secret.
///
/// A missing or blank header is a 401; anything else that fails to verify,
/// a bare `Bearer` included, is a 400.
pub fn verify_token(header: Option<&str>, secret: &str) -> Result<Claims, (StatusCode, &'static str)> {
    let raw = header.map(str::trim).unwrap_or_default();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return Err((StatusCode::UNAUTHORIZED, NO_TOKEN));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
    .map(|data| data.claims)
    .map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        (StatusCode::BAD_REQUEST, INVALID_TOKEN)
    })
}

/// Middleware that validates the bearer token and stores its claims in the
/// request extensions for later layers and handlers.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let claims = verify_token(header, &state.config.jwt_secret)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Middleware that admits only the configured roles. Must run after `authenticate`.
pub async fn authorize(
    State(roles): State<AllowedRoles>,
    req: Request,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or((StatusCode::UNAUTHORIZED, NO_TOKEN))?;

    if !roles.permits(&claims.role) {
        warn!("Role '{}' denied for {}", claims.role, claims.name);
        return Err((StatusCode::FORBIDDEN, FORBIDDEN));
    }
    Ok(next.run(req).await)
}

/// GET /protected - Greets an authorized caller
pub async fn protected_handler(Extension(claims): Extension<Claims>) -> String {
    format!("Hello, {}", claims.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::{serve, test_state};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "your-secret-key";

    fn token(role: &str, exp: usize, secret: &str) -> String {
        let claims = Claims { name: "Mehrshad".to_string(), role: role.to_string(), exp: Some(exp) };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn verify_token_classifies_failures() {
        assert_eq!(verify_token(None, SECRET).unwrap_err().0, StatusCode::UNAUTHORIZED);
        assert_eq!(verify_token(Some("   "), SECRET).unwrap_err().0, StatusCode::UNAUTHORIZED);
        assert_eq!(verify_token(Some("Bearer "), SECRET).unwrap_err().0, StatusCode::BAD_REQUEST);
        assert_eq!(verify_token(Some("garbage"), SECRET).unwrap_err().0, StatusCode::BAD_REQUEST);

        let forged = token("admin", far_future(), "another-secret");
        assert_eq!(verify_token(Some(&forged), SECRET).unwrap_err().0, StatusCode::BAD_REQUEST);

        let expired = token("admin", 1_000, SECRET);
        assert_eq!(verify_token(Some(&expired), SECRET).unwrap_err().0, StatusCode::BAD_REQUEST);

        let good = token("admin", far_future(), SECRET);
        assert_eq!(verify_token(Some(&good), SECRET).unwrap().role, "admin");
        let bearer = format!("Bearer {}", good);
        assert_eq!(verify_token(Some(&bearer), SECRET).unwrap().name, "Mehrshad");
    }

    #[test]
    fn token_without_expiry_is_accepted() {
        let payload = serde_json::json!({
            "name": "Mehrshad",
            "role": "admin",
            "iat": chrono::Utc::now().timestamp(),
        });
        let signed = encode(&Header::default(), &payload, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();

        let claims = verify_token(Some(&signed), SECRET).unwrap();
        assert_eq!(claims.name, "Mehrshad");
        assert_eq!(claims.exp, None);

        let nameless = serde_json::json!({ "role": "viewer" });
        let signed = encode(&Header::default(), &nameless, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
        assert_eq!(verify_token(Some(&signed), SECRET).unwrap().role, "viewer");
    }

    #[test]
    fn admin_roles_are_exclusive() {
        assert!(ADMIN_ROLES.permits("admin"));
        assert!(!ADMIN_ROLES.permits("viewer"));
        assert!(!ADMIN_ROLES.permits("Admin"));
    }

    #[tokio::test]
    async fn protected_route_statuses() {
        let base = serve(test_state().await).await;
        let client = reqwest::Client::new();
        let url = format!("{}/protected", base);

        let resp = client.get(&url).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 401);

        let resp = client.get(&url).header("Authorization", "nonsense").send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 400);

        let viewer = token("viewer", far_future(), SECRET);
        let resp = client.get(&url).header("Authorization", viewer).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 403);

        let admin = token("admin", far_future(), SECRET);
        let resp = client.get(&url).header("Authorization", admin).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(resp.text().await.unwrap(), "Hello, Mehrshad");
    }
}
