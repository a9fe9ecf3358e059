//! Mapping from usernames to their storage directories.
//!
//! Layout:
//! ```text
//! {uploads_root}/
//! └── alice/
//!     └── notes.txt
//! {backups_root}/
//! └── alice/
//!     └── 2024-05-01/
//!         └── notes.txt
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::lock::NamespaceLocks;
use super::validation::validate_username;
use crate::{FilenestError, Result};

/// The pair of directories belonging to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Owner of the namespace.
    pub username: String,
    /// Directory holding the live files.
    pub upload_dir: PathBuf,
    /// Directory holding one subdirectory per snapshot date.
    pub backup_dir: PathBuf,
}

/// Resolves usernames to namespaces under two configured roots.
///
/// Cloning is cheap; clones share the same lock table.
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    uploads_root: PathBuf,
    backups_root: PathBuf,
    locks: Arc<NamespaceLocks>,
}

impl NamespaceResolver {
    /// Create a resolver, creating both roots if they don't exist.
    pub fn new(uploads_root: impl Into<PathBuf>, backups_root: impl Into<PathBuf>) -> Result<Self> {
        let uploads_root = uploads_root.into();
        let backups_root = backups_root.into();
        fs::create_dir_all(&uploads_root)?;
        fs::create_dir_all(&backups_root)?;

        Ok(Self {
            uploads_root,
            backups_root,
            locks: Arc::new(NamespaceLocks::new()),
        })
    }

    /// Root directory of all upload directories.
    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }

    /// Root directory of all backup directories.
    pub fn backups_root(&self) -> &Path {
        &self.backups_root
    }

    /// Shared per-namespace lock table.
    pub fn locks(&self) -> &NamespaceLocks {
        &self.locks
    }

    /// Compute the namespace paths for a username without touching the disk.
    pub fn paths(&self, username: &str) -> Result<Namespace> {
        validate_username(username).map_err(|e| FilenestError::Validation(e.to_string()))?;

        Ok(Namespace {
            username: username.to_string(),
            upload_dir: self.uploads_root.join(username),
            backup_dir: self.backups_root.join(username),
        })
    }

    /// Resolve a username to its namespace, creating both directories if needed.
    ///
    /// Repeated calls are no-ops once the directories exist.
    pub fn resolve(&self, username: &str) -> Result<Namespace> {
        let namespace = self.paths(username)?;

        for dir in [&namespace.upload_dir, &namespace.backup_dir] {
            if !dir.is_dir() {
                debug!(username, dir = %dir.display(), "Creating namespace directory");
                fs::create_dir_all(dir)?;
            }
        }

        Ok(namespace)
    }
}
