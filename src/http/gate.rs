//! Admission gates.
//!
//! `global_gate` throttles all API traffic per client IP. `write_gate`
//! throttles prompt creation per authenticated user and must run after
//! [`require_auth`](super::auth::require_auth). A rejected request never
//! reaches its handler.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::ratelimit::{Dimension, RateLimiter};

use super::auth::AuthUser;
use super::error::ApiError;
use super::state::AppState;

/// Key used when no client address can be determined.
const UNKNOWN_CLIENT: &str = "unknown";

/// Throttle every request by client IP.
pub async fn global_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = client_ip(&request, state.trust_proxy);
    admit(&state.limiter, Dimension::Global, &ip)?;
    Ok(next.run(request).await)
}

/// Throttle content creation by authenticated user.
pub async fn write_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(ApiError::Unauthorized("Unauthorized"))?;
    admit(&state.limiter, Dimension::WritePath, &user.id)?;
    Ok(next.run(request).await)
}

fn admit(limiter: &RateLimiter, dimension: Dimension, key: &str) -> Result<(), ApiError> {
    if limiter.try_admit(dimension, key) {
        return Ok(());
    }

    warn!(dimension = %dimension, key = %key, "Request throttled");
    Err(ApiError::TooManyRequests(dimension.rejection_message()))
}

/// Resolve the client address used as the global rate limit key.
///
/// With `trust_proxy` the leftmost `X-Forwarded-For` entry, then `X-Real-IP`,
/// take precedence over the peer address.
pub fn client_ip<B>(request: &axum::http::Request<B>, trust_proxy: bool) -> String {
    let peer = || {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    };

    let ip = if trust_proxy {
        let headers = request.headers();
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| {
                headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
            .or_else(peer)
    } else {
        peer()
    };

    ip.unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
