//! JWT verification
//!
//! Tokens are issued by the hosted auth provider and signed with a shared
//! HS256 secret. The service only verifies them and turns the claims into
//! a [`UserProfile`].

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;
use crate::domain::UserProfile;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret shared with the auth provider
    pub secret: String,
    /// Expected `iss` claim, when the provider sets one
    pub issuer: Option<String>,
}

impl From<&SecurityConfig> for JwtConfig {
    fn from(security: &SecurityConfig) -> Self {
        Self {
            secret: security.jwt_secret.clone(),
            issuer: security.jwt_issuer.clone().filter(|i| !i.trim().is_empty()),
        }
    }
}

/// Free-form profile attributes set at sign-up
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Claims carried by the provider's access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl TokenClaims {
    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.sub,
            email: self.email.filter(|e| !e.trim().is_empty()),
            full_name: self.user_metadata.full_name,
        }
    }
}

/// Authentication errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Token is missing
    MissingToken,
    /// Token is invalid
    InvalidToken,
    /// Token has expired
    ExpiredToken,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingToken => write!(f, "Missing authentication token"),
            Self::InvalidToken => write!(f, "Invalid authentication token"),
            Self::ExpiredToken => write!(f, "Token has expired"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Verify and decode a JWT token
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<TokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;
    if let Some(issuer) = &config.issuer {
        validation.set_issuer(&[issuer]);
    }

    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })
}

/// Sign a token the way the auth provider does. Used by local tooling and
/// tests; production tokens come from the provider.
pub fn create_token(
    profile: &UserProfile,
    valid_for: Duration,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = TokenClaims {
        sub: profile.id.clone(),
        email: profile.email.clone(),
        user_metadata: UserMetadata {
            full_name: profile.full_name.clone(),
        },
        exp: (Utc::now() + valid_for).timestamp(),
        iss: config.issuer.clone(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}
