//! Dated snapshots of a user's upload directory.
//!
//! A snapshot is the directory `{backup_dir}/{YYYY-MM-DD}` holding flat copies
//! of the live files. Snapshots taken on the same day merge into the same
//! directory: same-named files are overwritten, others are left in place.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::files::{regular_file_names, regular_file_os_names, StoredFile};
use super::namespace::{Namespace, NamespaceResolver};
use crate::{FilenestError, Result};

/// Directory under the uploads root holding one staging directory per user.
///
/// Usernames can't start with a dot, so this never collides with a namespace.
const STAGING_DIR: &str = ".restore";

/// Parse a snapshot date in `YYYY-MM-DD` form.
///
/// Only the canonical zero-padded form is accepted, so the parsed date always
/// maps back to the same directory name.
pub fn parse_snapshot_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .filter(|date| date.to_string() == s)
        .ok_or_else(|| FilenestError::Validation(format!("invalid snapshot date: {s}")))
}

fn copy_files(from: &Path, to: &Path) -> Result<usize> {
    let names = regular_file_os_names(from)?;
    for name in &names {
        fs::copy(from.join(name), to.join(name))?;
        debug!(from = %from.display(), to = %to.display(), ?name, "Copied file");
    }
    Ok(names.len())
}

/// Creates, lists and restores snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    resolver: NamespaceResolver,
}

impl SnapshotManager {
    /// Create a snapshot manager over the given resolver.
    pub fn new(resolver: NamespaceResolver) -> Self {
        Self { resolver }
    }

    fn snapshot_dir(namespace: &Namespace, date: NaiveDate) -> PathBuf {
        namespace.backup_dir.join(date.to_string())
    }

    fn staging_dir(&self, username: &str) -> PathBuf {
        self.resolver.uploads_root().join(STAGING_DIR).join(username)
    }

    /// Snapshot the namespace under today's (UTC) date.
    pub fn create_snapshot(&self, username: &str) -> Result<NaiveDate> {
        self.create_snapshot_on(username, Utc::now().date_naive())
    }

    /// Snapshot the namespace under the given date.
    ///
    /// Copies every live file into the dated snapshot, overwriting files of the
    /// same name. Files only present in the snapshot are kept.
    pub fn create_snapshot_on(&self, username: &str, date: NaiveDate) -> Result<NaiveDate> {
        let namespace = self.resolver.resolve(username)?;
        let target = Self::snapshot_dir(&namespace, date);

        self.resolver.locks().with_namespace(username, || {
            fs::create_dir_all(&target)?;
            let copied = copy_files(&namespace.upload_dir, &target)?;
            info!(username, %date, files = copied, "Created snapshot");
            Ok(date)
        })
    }

    /// Dates of all snapshots of a namespace, oldest first.
    ///
    /// Entries of the backup directory that aren't date-named directories are
    /// ignored.
    pub fn list_snapshot_dates(&self, username: &str) -> Result<Vec<NaiveDate>> {
        let namespace = self.resolver.resolve(username)?;

        let mut dates = Vec::new();
        for entry in fs::read_dir(&namespace.backup_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(date) = entry
                .file_name()
                .to_str()
                .and_then(|name| parse_snapshot_date(name).ok())
            {
                dates.push(date);
            }
        }
        dates.sort_unstable();
        Ok(dates)
    }

    /// Files contained in one snapshot.
    pub fn snapshot_files(&self, username: &str, date: NaiveDate) -> Result<Vec<StoredFile>> {
        let namespace = self.resolver.resolve(username)?;
        let dir = Self::snapshot_dir(&namespace, date);
        if !dir.is_dir() {
            return Err(FilenestError::SnapshotNotFound(date.to_string()));
        }

        Ok(regular_file_names(&dir)?
            .into_iter()
            .map(StoredFile::from_name)
            .collect())
    }

    /// Replace the live files of a namespace with the files of a snapshot.
    ///
    /// Fails with `SnapshotNotFound`, leaving the namespace untouched, if no
    /// snapshot exists for `date`. The snapshot is copied into a staging
    /// directory first; live files are only removed once that copy has
    /// succeeded. The final swap is not atomic: a crash while moving staged
    /// files in can leave the namespace partially restored.
    pub fn restore(&self, username: &str, date: NaiveDate) -> Result<()> {
        let namespace = self.resolver.resolve(username)?;
        let source = Self::snapshot_dir(&namespace, date);
        let staging = self.staging_dir(username);

        self.resolver.locks().with_namespace(username, || {
            if !source.is_dir() {
                return Err(FilenestError::SnapshotNotFound(date.to_string()));
            }

            if staging.exists() {
                warn!(username, dir = %staging.display(), "Removing stale restore staging directory");
                fs::remove_dir_all(&staging)?;
            }
            fs::create_dir_all(&staging)?;

            if let Err(e) = copy_files(&source, &staging) {
                if let Err(cleanup) = fs::remove_dir_all(&staging) {
                    warn!(username, error = %cleanup, "Failed to remove restore staging directory");
                }
                return Err(e);
            }

            let live = regular_file_os_names(&namespace.upload_dir)?;
            for name in &live {
                fs::remove_file(namespace.upload_dir.join(name))?;
            }

            let staged = regular_file_os_names(&staging)?;
            for name in &staged {
                fs::rename(staging.join(name), namespace.upload_dir.join(name))?;
            }
            fs::remove_dir(&staging)?;

            info!(
                username,
                %date,
                removed = live.len(),
                restored = staged.len(),
                "Restored snapshot"
            );
            Ok(())
        })
    }
}
