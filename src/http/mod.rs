//! HTTP surface of the Promptshare API.

mod auth;
mod cors;
mod error;
mod gate;
mod handlers;
mod server;
mod state;

pub use auth::{require_auth, AuthUser, Claims, JwtAuthenticator};
pub use cors::build_cors_layer;
pub use error::ApiError;
pub use gate::{client_ip, global_gate, write_gate};
pub use server::HttpServer;
pub use state::AppState;

use std::time::Duration;

use axum::body::Body;
use axum::http::header::USER_AGENT;
use axum::http::{Request, Response};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, warn, Span};

use crate::config::CorsConfig;

/// Build the application router.
///
/// Every `/api` route passes the global gate. Prompt creation additionally
/// passes authentication and then the write path gate.
pub fn router(state: AppState, cors: &CorsConfig) -> Router {
    let create_prompt = post(handlers::create_prompt)
        .route_layer(from_fn_with_state(state.clone(), gate::write_gate))
        .route_layer(from_fn_with_state(state.clone(), auth::require_auth));

    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/prompts", get(handlers::list_prompts).merge(create_prompt))
        .route("/prompts/:id", get(handlers::get_prompt))
        .fallback(handlers::not_found)
        .layer(from_fn_with_state(state.clone(), gate::global_gate));

    let trust_proxy = state.trust_proxy;
    let mut router = Router::new().nest("/api", api).with_state(state);

    if let Some(cors) = build_cors_layer(cors) {
        router = router.layer(cors);
    }

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(move |request: &Request<Body>| request_span(request, trust_proxy))
            .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
                log_response(response, latency)
            })
            .on_failure(()),
    )
}

fn request_span<B>(request: &Request<B>, trust_proxy: bool) -> Span {
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");

    info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        client_ip = %client_ip(request, trust_proxy),
        user_agent = %user_agent,
    )
}

// 5xx at error, 4xx at warn, everything else at info.
fn log_response<B>(response: &Response<B>, latency: Duration) {
    let status = response.status().as_u16();
    let latency_ms = latency.as_millis() as u64;

    if response.status().is_server_error() {
        error!(status, latency_ms, "Request failed");
    } else if response.status().is_client_error() {
        warn!(status, latency_ms, "Request completed");
    } else {
        info!(status, latency_ms, "Request completed");
    }
}
