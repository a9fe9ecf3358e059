//! Response DTOs for Web API.

use chrono::NaiveDate;
use serde::Serialize;

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Result of an operation that has nothing to return but a message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Create a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Token issued on signup, login and account update.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Access token expiry in seconds.
    pub expires_in: u64,
    /// Username the token was issued for.
    pub username: String,
}

/// Result of creating a backup.
#[derive(Debug, Serialize)]
pub struct BackupCreatedResponse {
    /// Date of the snapshot that was written.
    pub date: NaiveDate,
    /// Human-readable outcome.
    pub message: String,
}
