//! Credential storage for filenest.
//!
//! The rest of the crate only sees the [`CredentialStore`] trait; which backend
//! holds the secrets is decided when the application is assembled.

mod credentials;
mod memory;
mod password;
mod sqlite;

pub use credentials::CredentialStore;
pub use memory::MemoryCredentialStore;
pub use password::{hash_password, verify_password, PasswordError};
pub use sqlite::SqliteCredentialStore;
