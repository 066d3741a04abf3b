use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::error::PersistenceError;

use super::key_value::KeyValueStore;

pub const TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "auth_user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Bearer token and signed-in user, kept in the client's key-value store.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self { Self { store } }

    pub async fn token(&self) -> Result<Option<String>, PersistenceError> {
        Ok(self.store.get(TOKEN_KEY).await?.filter(|t| !t.is_empty()))
    }

    pub async fn set_token(&self, token: &str) -> Result<(), PersistenceError> {
        self.store.set(TOKEN_KEY, token).await
    }

    pub async fn user(&self) -> Result<Option<AuthUser>, PersistenceError> {
        match self.store.get(USER_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set_user(&self, user: &AuthUser) -> Result<(), PersistenceError> {
        self.store.set(USER_KEY, &serde_json::to_string(user)?).await
    }

    pub async fn clear(&self) -> Result<(), PersistenceError> {
        self.store.remove(TOKEN_KEY).await?;
        self.store.remove(USER_KEY).await
    }
}
