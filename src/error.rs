// Error taxonomy for the authentication core

use thiserror::Error;

/// Token validation failures.
///
/// These are absorbed by the authentication gate: an unusable token yields
/// an anonymous request, never an error response from the gate itself.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// The token cannot be parsed into the expected three-part structure.
    #[error("token is malformed")]
    Malformed,

    /// The recomputed MAC does not match the embedded signature.
    #[error("token signature does not verify")]
    SignatureInvalid,

    /// The token's expiry timestamp is in the past.
    #[error("token has expired")]
    Expired,
}

/// Counter store failures. Whether these fail open or closed is a
/// deployment decision (`store.on_unavailable`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
}

/// Identity directory failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("identity directory unavailable: {0}")]
    Unavailable(String),
}

/// Definitive outcomes of a login attempt, surfaced to the API boundary.
///
/// Unknown identities are reported as `BadCredential` so callers cannot
/// probe for account existence.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("invalid credentials")]
    BadCredential,

    /// Too many recent failures for this identity; the lock expires on its
    /// own once a full window passes without further failures.
    #[error("too many failed attempts, account temporarily locked")]
    AccountLocked,

    #[error("account is disabled")]
    AccountDisabled,

    /// Locked by an administrator, distinct from the brute-force lock.
    #[error("account is locked by an administrator")]
    AccountAdminLocked,

    #[error("token issuance failed")]
    TokenIssuance(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Rate limiter outcomes other than admission. The calling handler decides
/// the resulting response.
#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limit exceeded")]
    Exceeded { retry_after_secs: u64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}
