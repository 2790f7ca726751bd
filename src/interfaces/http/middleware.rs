//! Authentication middleware for Axum
//!
//! Verifies the auth provider's bearer token and stores the caller's
//! [`UserProfile`] in the request extensions.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::domain::UserProfile;
use crate::infrastructure::crypto::{verify_token, AuthError, JwtConfig};
use crate::interfaces::http::common::ApiError;

#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authenticate a request from its `Authorization` header
pub fn authenticate(request: &Request<Body>, config: &JwtConfig) -> Result<UserProfile, AuthError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;
    let token = extract_token(auth_header).ok_or(AuthError::InvalidToken)?;
    Ok(verify_token(token, config)?.into_profile())
}

/// JWT authentication middleware - requires a valid token
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&request, &auth_state.jwt_config) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            debug!(error = %e, path = %request.uri().path(), "Rejected unauthenticated request");
            ApiError::unauthorized(e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(extract_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_token("Basic dXNlcg=="), None);
        assert_eq!(extract_token("Bearer   "), None);
    }

    #[test]
    fn missing_header_is_reported() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let config = JwtConfig {
            secret: "s".into(),
            issuer: None,
        };
        assert_eq!(
            authenticate(&request, &config).unwrap_err(),
            AuthError::MissingToken
        );
    }
}
