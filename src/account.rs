//! Account workflows: signup, login and account updates.
//!
//! These coordinate the credential store with the storage layer so that a
//! user's namespace follows their username.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::auth::CredentialStore;
use crate::storage::{validate_username, AccountDirectoryMigrator, Namespace, NamespaceResolver};
use crate::{FilenestError, Result};

/// Account-level operations.
#[derive(Clone)]
pub struct AccountService {
    credentials: Arc<dyn CredentialStore>,
    resolver: NamespaceResolver,
    migrator: AccountDirectoryMigrator,
}

impl AccountService {
    /// Create a new account service.
    pub fn new(credentials: Arc<dyn CredentialStore>, resolver: NamespaceResolver) -> Self {
        let migrator = AccountDirectoryMigrator::new(resolver.clone());
        Self {
            credentials,
            resolver,
            migrator,
        }
    }

    /// The credential store behind this service.
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Register a user and create their namespace.
    pub async fn signup(&self, username: &str, secret: &str) -> Result<Namespace> {
        if username.is_empty() || secret.is_empty() {
            return Err(FilenestError::Validation("missing data".to_string()));
        }
        validate_username(username).map_err(|e| FilenestError::Validation(e.to_string()))?;

        if self.credentials.exists(username).await? {
            return Err(FilenestError::Conflict("user already exists".to_string()));
        }
        self.credentials.create(username, secret).await?;

        let namespace = self.resolver.resolve(username)?;
        info!(username, "Signed up");
        Ok(namespace)
    }

    /// Check a user's credentials.
    pub async fn login(&self, username: &str, secret: &str) -> Result<()> {
        if self.credentials.verify(username, secret).await? {
            Ok(())
        } else {
            Err(FilenestError::Auth("invalid credentials".to_string()))
        }
    }

    /// Change a user's name and secret, moving their directories along.
    ///
    /// The credential entry is renamed first. If moving the directories then
    /// fails, the rename is reverted and the secret is left unchanged.
    pub async fn update_account(
        &self,
        username: &str,
        new_username: &str,
        new_secret: &str,
    ) -> Result<()> {
        if username.is_empty() || new_username.is_empty() || new_secret.is_empty() {
            return Err(FilenestError::Validation("missing data".to_string()));
        }
        validate_username(new_username).map_err(|e| FilenestError::Validation(e.to_string()))?;

        if !self.credentials.exists(username).await? {
            return Err(FilenestError::NotFound("user".to_string()));
        }
        let renamed = new_username != username;
        if renamed && self.credentials.exists(new_username).await? {
            return Err(FilenestError::Conflict("username already exists".to_string()));
        }

        if renamed {
            self.credentials.rename(username, new_username).await?;
        }

        if let Err(e) = self.migrator.migrate(username, new_username) {
            error!(username, new_username, error = %e, "Failed to migrate account directories");
            if renamed {
                if let Err(revert) = self.credentials.rename(new_username, username).await {
                    warn!(username, new_username, error = %revert, "Failed to revert credential rename");
                }
            }
            return Err(e);
        }
        self.credentials.update_secret(new_username, new_secret).await?;

        info!(username, new_username, "Updated account");
        Ok(())
    }
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
