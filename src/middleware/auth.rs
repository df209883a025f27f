use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::directory::IdentityDirectory;
use crate::auth::jwt::TokenService;
use crate::models::Principal;

/// State for the authentication gate: token validation plus the directory
/// used to refresh role membership on every request.
#[derive(Clone)]
pub struct AuthGate {
    pub tokens: Arc<TokenService>,
    pub directory: Arc<dyn IdentityDirectory>,
    pub header_name: String,
    pub scheme_prefix: String,
    pub lookup_timeout: Duration,
}

/// Optional token validation, one pass per request.
///
/// A missing or unusable token attaches no principal; whether such a request
/// may proceed is decided by the authorization stage, never here.
pub async fn authenticate(
    State(gate): State<AuthGate>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(principal) = resolve_principal(&gate, &headers).await {
        request.extensions_mut().insert(principal);
    }
    next.run(request).await
}

async fn resolve_principal(gate: &AuthGate, headers: &HeaderMap) -> Option<Principal> {
    let header = headers.get(gate.header_name.as_str())?.to_str().ok()?;
    let token = header.strip_prefix(gate.scheme_prefix.as_str())?;

    let claims = match gate.tokens.validate(token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Discarding invalid token: {}", e);
            return None;
        }
    };

    // Role membership may have changed since issuance; the directory, not
    // the token's role claim, is authoritative for the principal's roles.
    let lookup = tokio::time::timeout(
        gate.lookup_timeout,
        gate.directory.find_by_username_or_email(&claims.sub),
    )
    .await;

    match lookup {
        Ok(Ok(Some(user))) => Some(Principal {
            username: user.username,
            user_id: claims.user_id,
            roles: user.roles,
        }),
        Ok(Ok(None)) => {
            debug!("Token subject {} not found in directory", claims.sub);
            None
        }
        Ok(Err(e)) => {
            debug!("Directory lookup failed for {}: {}", claims.sub, e);
            None
        }
        Err(_) => {
            debug!("Directory lookup timed out for {}", claims.sub);
            None
        }
    }
}
