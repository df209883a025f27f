// Identity lookup collaborators
// The directory owns account persistence; this core only reads from it.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::DirectoryError;
use crate::models::DirectoryUser;

/// Read side of the external identity store.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Look up an account by username or registered email address.
    async fn find_by_username_or_email(
        &self,
        identity: &str,
    ) -> Result<Option<DirectoryUser>, DirectoryError>;
}

/// Directory serving accounts from process memory, for tests and
/// single-node demo deployments.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<String, DirectoryUser>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<DirectoryUser>) -> Self {
        let map = users
            .into_iter()
            .map(|u| (u.username.clone(), u))
            .collect();
        Self {
            users: RwLock::new(map),
        }
    }

    /// Insert or replace an account, keyed by username.
    pub async fn insert(&self, user: DirectoryUser) {
        self.users.write().await.insert(user.username.clone(), user);
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryDirectory {
    async fn find_by_username_or_email(
        &self,
        identity: &str,
    ) -> Result<Option<DirectoryUser>, DirectoryError> {
        let users = self.users.read().await;
        if let Some(user) = users.get(identity) {
            return Ok(Some(user.clone()));
        }
        Ok(users
            .values()
            .find(|u| u.email.as_deref() == Some(identity))
            .cloned())
    }
}
