//! Persisted sign-in credentials

use std::sync::Arc;
use tracing::{debug, warn};

use qhse_session::UserProfile;
use qhse_storage::KeyValueStore;

use crate::error::Result;

/// Storage key for the raw bearer token
pub const TOKEN_KEY: &str = "token";
/// Storage key for the JSON-serialized user profile
pub const USER_KEY: &str = "user";

/// Typed view over the two credential keys in durable storage
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Stored token; an empty string counts as absent
    pub async fn token(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(TOKEN_KEY)
            .await?
            .filter(|token| !token.trim().is_empty()))
    }

    /// Stored user; malformed JSON is an error
    pub async fn user(&self) -> Result<Option<UserProfile>> {
        match self.store.get(USER_KEY).await? {
            Some(raw) if !raw.trim().is_empty() && raw.trim() != "null" => {
                Ok(Some(serde_json::from_str(&raw)?))
            }
            _ => Ok(None),
        }
    }

    /// Both halves of a session, or `None` if either is missing
    pub async fn load(&self) -> Result<Option<(UserProfile, String)>> {
        let token = self.token().await?;
        let user = self.user().await?;
        Ok(match (user, token) {
            (Some(user), Some(token)) => Some((user, token)),
            _ => None,
        })
    }

    pub async fn save(&self, user: &UserProfile, token: &str) -> Result<()> {
        let user = serde_json::to_string(user)?;
        self.store.set(TOKEN_KEY, token).await?;
        if let Err(e) = self.store.set(USER_KEY, &user).await {
            // a token must never be stored without its user
            if let Err(undo) = self.store.remove(TOKEN_KEY).await {
                warn!(error = %undo, "could not roll back stored token");
            }
            return Err(e.into());
        }
        debug!("persisted session credentials");
        Ok(())
    }

    /// Removes both keys; attempts the second even if the first fails
    pub async fn clear(&self) -> Result<()> {
        let token = self.store.remove(TOKEN_KEY).await;
        let user = self.store.remove(USER_KEY).await;
        token?;
        user?;
        debug!("cleared session credentials");
        Ok(())
    }
}
