//! Bearer-token authentication middleware for Axum

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::jwt::{verify_token, JwtConfig, TokenClaims};

/// Authentication state shared by the protected routes
#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

/// Authenticated caller, inserted into request extensions.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: String,
}

impl AuthUser {
    fn from_claims(claims: &TokenClaims) -> Option<Self> {
        let user_id = claims.sub.parse().ok()?;
        Some(Self {
            user_id,
            role: claims.role.clone(),
        })
    }
}

fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "success": false,
            "error": message,
        })),
    )
        .into_response()
}

/// JWT authentication middleware
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let Some(header_value) = header_value else {
        return unauthorized("Missing Authorization header");
    };
    let Some(token) = extract_bearer(&header_value) else {
        return unauthorized("Expected a Bearer token");
    };

    let claims = match verify_token(token, &auth_state.jwt_config) {
        Ok(claims) => claims,
        Err(_) => return unauthorized("Invalid or expired token"),
    };

    let Some(user) = AuthUser::from_claims(&claims) else {
        return unauthorized("Token subject is not a user id");
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}
