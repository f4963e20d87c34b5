//! Shared router state.

use std::sync::Arc;

use crate::ratelimit::RateLimiter;
use crate::store::PromptStore;

use super::auth::JwtAuthenticator;

/// State handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub prompts: Arc<dyn PromptStore>,
    pub auth: Arc<JwtAuthenticator>,
    /// Key the global gate on proxy headers instead of the peer address
    pub trust_proxy: bool,
}
