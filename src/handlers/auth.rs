use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use super::AppState;
use crate::error::LoginError;
use crate::models::{LoginRequest, LoginResponse};

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), (StatusCode, Json<Value>)> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Username and password are required"
            })),
        ));
    }

    match state.login.login(&payload.username, &payload.password).await {
        Ok(token) => Ok((StatusCode::OK, Json(LoginResponse { token }))),
        Err(e) => Err(login_error_response(e)),
    }
}

/// Map each login outcome to a stable response code so clients can react
/// without parsing messages.
fn login_error_response(err: LoginError) -> (StatusCode, Json<Value>) {
    let status = match &err {
        LoginError::BadCredential => StatusCode::UNAUTHORIZED,
        LoginError::AccountLocked | LoginError::AccountAdminLocked => StatusCode::LOCKED,
        LoginError::AccountDisabled => StatusCode::FORBIDDEN,
        LoginError::Store(_) | LoginError::Directory(_) => StatusCode::SERVICE_UNAVAILABLE,
        LoginError::TokenIssuance(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(json!({ "error": err.to_string() })))
}
