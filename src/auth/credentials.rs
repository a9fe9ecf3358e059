//! Credential store abstraction.

use async_trait::async_trait;
use rand_core::{OsRng, RngCore};

use super::password::{hash_password, PasswordError};
use crate::{FilenestError, Result};

/// Key-value store of username to secret.
///
/// Implementations hash secrets before persisting them; `verify` is the only
/// way to check one.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Whether a user with this name exists.
    async fn exists(&self, username: &str) -> Result<bool>;

    /// Add a user. Fails with `Conflict` if the name is taken.
    async fn create(&self, username: &str, secret: &str) -> Result<()>;

    /// Check a secret. Unknown users verify as `false`.
    async fn verify(&self, username: &str, secret: &str) -> Result<bool>;

    /// Move a user's entry to a new name, keeping the secret.
    ///
    /// Fails with `NotFound` if `old_username` is unknown and with `Conflict`
    /// if `new_username` is taken by someone else. Renaming to the same name
    /// succeeds without changes.
    async fn rename(&self, old_username: &str, new_username: &str) -> Result<()>;

    /// Replace a user's secret. Fails with `NotFound` for an unknown user.
    async fn update_secret(&self, username: &str, new_secret: &str) -> Result<()>;

    /// The stamp currently attached to a user, or `None` for unknown users.
    ///
    /// A fresh stamp is drawn whenever an entry is created or renamed, so a
    /// name that is given up and later taken by someone else carries a
    /// different stamp than before.
    async fn stamp(&self, username: &str) -> Result<Option<i64>>;
}

/// Draw a new random credential stamp.
pub(crate) fn new_stamp() -> i64 {
    (OsRng.next_u64() >> 1) as i64
}

/// Hash a secret, mapping failures into the crate error.
pub(crate) fn hash_secret(secret: &str) -> Result<String> {
    hash_password(secret).map_err(|e| match e {
        PasswordError::Empty => FilenestError::Validation(e.to_string()),
        other => FilenestError::Auth(other.to_string()),
    })
}

pub(crate) fn user_not_found(username: &str) -> FilenestError {
    FilenestError::NotFound(format!("user {username}"))
}

pub(crate) fn user_taken(username: &str) -> FilenestError {
    FilenestError::Conflict(format!("username {username} already exists"))
}
