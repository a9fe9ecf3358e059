//! Live file operations scoped to one user's upload directory.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::namespace::NamespaceResolver;
use super::validation::validate_file_name;
use crate::{FilenestError, Result};

/// A file in a namespace, identified by its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    /// File name, unique within the namespace.
    pub name: String,
    /// Lower-cased extension including the leading dot, or empty.
    pub extension: String,
}

impl StoredFile {
    /// Build an entry from a file name, deriving the extension.
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let extension = extension_of(&name);
        Self { name, extension }
    }
}

/// Extension of a file name as shown to users.
///
/// `report.PDF` gives `.pdf`, `archive.tar.gz` gives `.gz`, and `.hidden` or
/// `README` give an empty string.
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Names of the regular files directly inside `dir`, exactly as stored.
///
/// Subdirectories are skipped.
pub(crate) fn regular_file_os_names(dir: &Path) -> Result<Vec<OsString>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name());
        }
    }
    Ok(names)
}

/// Names of the regular files directly inside `dir`, in enumeration order.
///
/// Subdirectories are skipped, as are names that aren't valid UTF-8.
pub(crate) fn regular_file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for raw in regular_file_os_names(dir)? {
        match raw.into_string() {
            Ok(name) => names.push(name),
            Err(raw) => warn!(dir = %dir.display(), name = ?raw, "Skipping non UTF-8 file name"),
        }
    }
    Ok(names)
}

fn checked_name(name: &str) -> Result<()> {
    validate_file_name(name).map_err(|e| FilenestError::Validation(e.to_string()))
}

/// File operations on a user's upload directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    resolver: NamespaceResolver,
}

impl FileStore {
    /// Create a file store over the given resolver.
    pub fn new(resolver: NamespaceResolver) -> Self {
        Self { resolver }
    }

    /// The resolver this store works through.
    pub fn resolver(&self) -> &NamespaceResolver {
        &self.resolver
    }

    fn file_path(&self, username: &str, name: &str) -> Result<PathBuf> {
        checked_name(name)?;
        let namespace = self.resolver.resolve(username)?;
        Ok(namespace.upload_dir.join(name))
    }

    /// List the files of a namespace.
    ///
    /// Order is whatever the filesystem returns; an empty or new namespace
    /// yields an empty list.
    pub fn list(&self, username: &str) -> Result<Vec<StoredFile>> {
        let namespace = self.resolver.resolve(username)?;
        let files = regular_file_names(&namespace.upload_dir)?
            .into_iter()
            .map(StoredFile::from_name)
            .collect();
        Ok(files)
    }

    /// Write a file, replacing any existing file of the same name.
    pub fn save(&self, username: &str, name: &str, content: &[u8]) -> Result<()> {
        let path = self.file_path(username, name)?;

        self.resolver.locks().with_namespace(username, || {
            fs::write(&path, content)?;
            debug!(username, name, size = content.len(), "Saved file");
            Ok(())
        })
    }

    /// Rename a file.
    ///
    /// Fails with `NotFound` if `old_name` doesn't exist and with
    /// `AlreadyExists` if `new_name` does. Unlike [`save`](Self::save), a
    /// rename never overwrites.
    pub fn rename(&self, username: &str, old_name: &str, new_name: &str) -> Result<()> {
        let old_path = self.file_path(username, old_name)?;
        let new_path = self.file_path(username, new_name)?;

        self.resolver.locks().with_namespace(username, || {
            if !old_path.is_file() {
                return Err(FilenestError::NotFound(format!("file {old_name}")));
            }
            if new_path.exists() {
                return Err(FilenestError::AlreadyExists(format!("file {new_name}")));
            }

            fs::rename(&old_path, &new_path)?;
            info!(username, old_name, new_name, "Renamed file");
            Ok(())
        })
    }

    /// Delete a file.
    ///
    /// Returns `true` if the file was deleted, `false` if it didn't exist.
    pub fn delete(&self, username: &str, name: &str) -> Result<bool> {
        let path = self.file_path(username, name)?;

        self.resolver
            .locks()
            .with_namespace(username, || match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(username, name, "Deleted file");
                    Ok(true)
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e.into()),
            })
    }

    /// Read the full content of a file.
    pub fn read(&self, username: &str, name: &str) -> Result<Vec<u8>> {
        let path = self.file_path(username, name)?;

        match fs::read(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FilenestError::NotFound(format!("file {name}")))
            }
            Err(e) => Err(e.into()),
        }
    }
}
