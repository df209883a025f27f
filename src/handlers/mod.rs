pub mod auth;
pub mod health;
pub mod user;

use std::sync::Arc;

use crate::auth::login::LoginFlow;
use crate::auth::rate_limit::RateLimiter;
use crate::config::FailurePolicy;

/// Shared handler state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub login: Arc<LoginFlow>,
    pub rate_limiter: Arc<RateLimiter>,
    pub on_store_error: FailurePolicy,
}
