//! API handlers for the Web API.

pub mod auth;
pub mod backup;
pub mod file;

use std::sync::Arc;

use jsonwebtoken::{encode, EncodingKey, Header};

use crate::account::AccountService;
use crate::auth::CredentialStore;
use crate::storage::{FileStore, NamespaceResolver, SnapshotManager};
use crate::web::error::ApiError;
use crate::web::middleware::{JwtClaims, JwtState};

pub use auth::*;
pub use backup::*;
pub use file::*;

/// Application state shared by all handlers.
pub struct AppState {
    /// Per-user file operations.
    pub files: FileStore,
    /// Per-user backups.
    pub snapshots: SnapshotManager,
    /// Signup, login and account updates.
    pub accounts: AccountService,
    /// JWT encoding key.
    pub encoding_key: EncodingKey,
    /// JWT verification settings.
    pub jwt: JwtState,
    /// Access token expiry in seconds.
    pub access_token_expiry: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        resolver: NamespaceResolver,
        jwt_secret: &str,
        access_expiry: u64,
    ) -> Self {
        Self {
            files: FileStore::new(resolver.clone()),
            snapshots: SnapshotManager::new(resolver.clone()),
            accounts: AccountService::new(credentials, resolver),
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            jwt: JwtState::new(jwt_secret),
            access_token_expiry: access_expiry,
        }
    }

    /// Generate an access token for a user holding the given credential stamp.
    pub fn generate_access_token(&self, username: &str, stamp: i64) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: username.to_string(),
            stamp,
            iat: now,
            exp: now + self.access_token_expiry,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }
}
