//! Request DTOs for Web API.
//!
//! Missing fields deserialize as empty strings so the account layer can
//! answer with its own "missing data" message.

use serde::Deserialize;

/// Signup and login request.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    /// Username.
    #[serde(default)]
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

/// Account update request.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    /// New username (may equal the current one).
    #[serde(default)]
    pub new_username: String,
    /// New password.
    #[serde(default)]
    pub new_password: String,
}

/// File rename request.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    /// Current file name.
    pub old_name: String,
    /// Desired file name.
    pub new_name: String,
}
