//! In-memory credential store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::credentials::{hash_secret, new_stamp, user_not_found, user_taken, CredentialStore};
use super::password::verify_password;
use crate::Result;

/// Credential store that lives only as long as the process.
///
/// Used by tests and for throwaway instances.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, Entry>>,
}

#[derive(Debug)]
struct Entry {
    secret_hash: String,
    stamp: i64,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn exists(&self, username: &str) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(username))
    }

    async fn create(&self, username: &str, secret: &str) -> Result<()> {
        let hash = hash_secret(secret)?;
        let mut entries = self.entries.write().await;
        if entries.contains_key(username) {
            return Err(user_taken(username));
        }
        entries.insert(
            username.to_string(),
            Entry {
                secret_hash: hash,
                stamp: new_stamp(),
            },
        );
        Ok(())
    }

    async fn verify(&self, username: &str, secret: &str) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(username)
            .is_some_and(|entry| verify_password(secret, &entry.secret_hash).is_ok()))
    }

    async fn rename(&self, old_username: &str, new_username: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        if !entries.contains_key(old_username) {
            return Err(user_not_found(old_username));
        }
        if old_username == new_username {
            return Ok(());
        }
        if entries.contains_key(new_username) {
            return Err(user_taken(new_username));
        }
        if let Some(mut entry) = entries.remove(old_username) {
            entry.stamp = new_stamp();
            entries.insert(new_username.to_string(), entry);
        }
        Ok(())
    }

    async fn update_secret(&self, username: &str, new_secret: &str) -> Result<()> {
        let hash = hash_secret(new_secret)?;
        let mut entries = self.entries.write().await;
        match entries.get_mut(username) {
            Some(entry) => {
                entry.secret_hash = hash;
                Ok(())
            }
            None => Err(user_not_found(username)),
        }
    }

    async fn stamp(&self, username: &str) -> Result<Option<i64>> {
        Ok(self.entries.read().await.get(username).map(|e| e.stamp))
    }
}
