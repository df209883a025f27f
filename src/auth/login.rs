// Login orchestration: lockout check, credential verification, token issuance

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::auth::attempts::AttemptLedger;
use crate::auth::directory::IdentityDirectory;
use crate::auth::jwt::TokenService;
use crate::auth::password::verify_password;
use crate::config::FailurePolicy;
use crate::error::{LoginError, StoreError};

/// Turns a username/password pair into an issued token or a definitive
/// rejection.
pub struct LoginFlow {
    directory: Arc<dyn IdentityDirectory>,
    ledger: AttemptLedger,
    tokens: Arc<TokenService>,
    on_store_error: FailurePolicy,
}

impl LoginFlow {
    pub fn new(
        directory: Arc<dyn IdentityDirectory>,
        ledger: AttemptLedger,
        tokens: Arc<TokenService>,
        on_store_error: FailurePolicy,
    ) -> Self {
        Self {
            directory,
            ledger,
            tokens,
            on_store_error,
        }
    }

    pub async fn login(&self, identity: &str, password: &str) -> Result<String, LoginError> {
        // Locked identities are rejected before any directory or credential
        // work happens.
        match self.ledger.is_locked(identity).await {
            Ok(true) => {
                warn!("Login rejected for {}: attempt limit reached", identity);
                return Err(LoginError::AccountLocked);
            }
            Ok(false) => {}
            Err(e) => self.absorb_store_error(e)?,
        }

        let user = match self.directory.find_by_username_or_email(identity).await? {
            Some(user) => user,
            None => {
                // Unknown identities count as credential failures so callers
                // cannot probe for account existence.
                self.note_failure(identity).await?;
                return Err(LoginError::BadCredential);
            }
        };

        let password_ok = match verify_password(password, &user.password_hash) {
            Ok(ok) => ok,
            Err(e) => {
                error!("Password verification failed for {}: {}", identity, e);
                false
            }
        };
        if !password_ok {
            self.note_failure(identity).await?;
            return Err(LoginError::BadCredential);
        }

        // The counter clears as soon as the credential checks out; the flag
        // checks below can still refuse the login.
        match self.ledger.record_success(identity).await {
            Ok(()) => {}
            Err(e) => self.absorb_store_error(e)?,
        }

        if !user.enabled {
            return Err(LoginError::AccountDisabled);
        }
        if user.locked {
            return Err(LoginError::AccountAdminLocked);
        }

        let role = user.roles.first().map(|r| r.as_code()).unwrap_or("UNKNOWN");
        let token = self.tokens.issue(&user.username, role, user.id)?;
        info!("Issued token for {} (user id {})", user.username, user.id);
        Ok(token)
    }

    async fn note_failure(&self, identity: &str) -> Result<(), LoginError> {
        if let Err(e) = self.ledger.record_failure(identity).await {
            self.absorb_store_error(e)?;
        }
        Ok(())
    }

    fn absorb_store_error(&self, e: StoreError) -> Result<(), LoginError> {
        match self.on_store_error {
            FailurePolicy::Open => {
                warn!(
                    "Counter store unavailable, continuing without lockout bookkeeping: {}",
                    e
                );
                Ok(())
            }
            FailurePolicy::Closed => Err(e.into()),
        }
    }
}
