//! Bearer token authentication.
//!
//! Tokens are HS256 JWTs whose `sub` claim is the user id. The authenticated
//! identity is stored in the request extensions as [`AuthUser`] for the write
//! path gate and the handlers.

use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ApiError;
use super::state::AppState;

/// JWT claims accepted by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Expiry, seconds since the epoch
    pub exp: u64,
    /// Issued at, seconds since the epoch
    #[serde(default)]
    pub iat: u64,
}

/// Verifies (and, for tooling and tests, issues) HS256 tokens.
pub struct JwtAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn from_secret(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Verify a token and return its claims.
    ///
    /// Tokens with a blank `sub` are rejected.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Rejected bearer token");
                ApiError::Unauthorized("Invalid token")
            })?;

        if claims.sub.trim().is_empty() {
            debug!("Rejected bearer token without a subject");
            return Err(ApiError::Unauthorized("Invalid token"));
        }

        Ok(claims)
    }

    /// Issue a token for `user_id` valid for `ttl`.
    pub fn issue(&self, user_id: &str, ttl: Duration) -> jsonwebtoken::errors::Result<String> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + ttl.as_secs(),
            iat: now,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized("Unauthorized"))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware rejecting requests without a valid bearer token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or(ApiError::Unauthorized("No authorization header"))?;
    let claims = state.auth.verify(token)?;

    request.extensions_mut().insert(AuthUser { id: claims.sub });
    Ok(next.run(request).await)
}
