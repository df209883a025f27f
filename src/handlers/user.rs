use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::warn;

use super::AppState;
use crate::config::FailurePolicy;
use crate::error::RateLimitError;
use crate::models::Principal;

const RATE_KEY_PREFIX: &str = "rate_limit:";

/// Demo endpoint with explicit call-volume protection keyed by username.
pub async fn hello(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let key = format!("{RATE_KEY_PREFIX}{}", principal.username);

    match state.rate_limiter.try_acquire(&key).await {
        Ok(()) => {}
        Err(RateLimitError::Exceeded { retry_after_secs }) => {
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": "rate_limit_exceeded",
                    "error_description": "Too many requests. Please try again later.",
                    "retry_after": retry_after_secs
                })),
            ));
        }
        Err(RateLimitError::Store(e)) => match state.on_store_error {
            FailurePolicy::Open => {
                warn!("Counter store unavailable, admitting request: {}", e);
            }
            FailurePolicy::Closed => {
                return Err((
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": e.to_string() })),
                ));
            }
        },
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": format!("Hello, {}!", principal.username)
        })),
    ))
}

/// Principal echo; the policy table restricts this route to the account
/// owner or an administrator.
pub async fn profile(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "id": id,
            "username": principal.username,
            "roles": principal.roles
        })),
    )
}

pub async fn admin_test(Extension(principal): Extension<Principal>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "message": format!("Admin access confirmed for {}", principal.username)
        })),
    )
}
