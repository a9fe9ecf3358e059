//! filenest - personal file storage service
//!
//! Users get an isolated namespace (an upload directory and a backup
//! directory) where they can store files and take dated snapshots.

pub mod account;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod web;

pub use account::AccountService;
pub use auth::{CredentialStore, MemoryCredentialStore, SqliteCredentialStore};
pub use config::Config;
pub use error::{FilenestError, Result};
pub use storage::{
    AccountDirectoryMigrator, FileStore, Namespace, NamespaceResolver, SnapshotManager, StoredFile,
};
