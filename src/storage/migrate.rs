//! Moving a namespace when its owner changes username.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use super::namespace::NamespaceResolver;
use crate::Result;

/// Renames a user's upload and backup directories.
#[derive(Debug, Clone)]
pub struct AccountDirectoryMigrator {
    resolver: NamespaceResolver,
}

impl AccountDirectoryMigrator {
    /// Create a migrator over the given resolver.
    pub fn new(resolver: NamespaceResolver) -> Self {
        Self { resolver }
    }

    /// Move `old_username`'s directories to `new_username`.
    ///
    /// Each root is handled on its own: an existing directory is renamed,
    /// a missing one is created empty under the new name. Checking that the
    /// new username is free is the credential store's job; a destination that
    /// already exists surfaces as a `Storage` error like any other filesystem
    /// failure. If the backup directory can't be moved, the upload directory
    /// is put back where it was before the error is returned.
    pub fn migrate(&self, old_username: &str, new_username: &str) -> Result<()> {
        let old = self.resolver.paths(old_username)?;
        let new = self.resolver.paths(new_username)?;

        let result: Result<()> =
            self.resolver
                .locks()
                .with_namespaces(old_username, new_username, || {
                    let uploads = move_or_create(&old.upload_dir, &new.upload_dir)?;
                    if let Err(e) = move_or_create(&old.backup_dir, &new.backup_dir) {
                        undo(uploads, &old.upload_dir, &new.upload_dir);
                        return Err(e);
                    }
                    Ok(())
                });
        result?;

        info!(old_username, new_username, "Migrated account directories");
        Ok(())
    }
}

/// What [`move_or_create`] did to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Moved {
    Renamed,
    Created,
    Unchanged,
}

fn move_or_create(from: &Path, to: &Path) -> Result<Moved> {
    if from == to {
        fs::create_dir_all(to)?;
        Ok(Moved::Unchanged)
    } else if from.is_dir() {
        debug!(from = %from.display(), to = %to.display(), "Renaming directory");
        fs::rename(from, to)?;
        Ok(Moved::Renamed)
    } else {
        debug!(dir = %to.display(), "Creating directory");
        fs::create_dir_all(to)?;
        Ok(Moved::Created)
    }
}

fn undo(moved: Moved, from: &Path, to: &Path) {
    let result = match moved {
        Moved::Renamed => fs::rename(to, from),
        Moved::Created => fs::remove_dir(to),
        Moved::Unchanged => Ok(()),
    };
    match result {
        Ok(()) => debug!(dir = %to.display(), ?moved, "Rolled back directory move"),
        Err(e) => warn!(dir = %to.display(), ?moved, error = %e, "Failed to roll back directory move"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, SnapshotManager};
    use crate::FilenestError;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn setup() -> (TempDir, NamespaceResolver, AccountDirectoryMigrator) {
        let temp_dir = TempDir::new().unwrap();
        let resolver = NamespaceResolver::new(
            temp_dir.path().join("uploads"),
            temp_dir.path().join("backups"),
        )
        .unwrap();
        let migrator = AccountDirectoryMigrator::new(resolver.clone());
        (temp_dir, resolver, migrator)
    }

    #[test]
    fn test_migrate_existing_directories() {
        let (temp_dir, resolver, migrator) = setup();
        let store = FileStore::new(resolver.clone());
        let snapshots = SnapshotManager::new(resolver);
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        store.save("alice", "a.txt", b"A").unwrap();
        snapshots.create_snapshot_on("alice", day).unwrap();

        migrator.migrate("alice", "bob").unwrap();

        let uploads = temp_dir.path().join("uploads");
        let backups = temp_dir.path().join("backups");
        assert!(!uploads.join("alice").exists());
        assert!(!backups.join("alice").exists());
        assert_eq!(store.read("bob", "a.txt").unwrap(), b"A");
        assert_eq!(snapshots.list_snapshot_dates("bob").unwrap(), vec![day]);
    }

    #[test]
    fn test_migrate_missing_directories_creates_fresh() {
        let (temp_dir, _resolver, migrator) = setup();

        migrator.migrate("alice", "bob").unwrap();

        assert!(temp_dir.path().join("uploads/bob").is_dir());
        assert!(temp_dir.path().join("backups/bob").is_dir());
        assert!(!temp_dir.path().join("uploads/alice").exists());
        assert_eq!(
            fs::read_dir(temp_dir.path().join("uploads/bob")).unwrap().count(),
            0
        );
    }

    #[test]
    fn test_migrate_roots_independently() {
        let (temp_dir, _resolver, migrator) = setup();
        let old_upload = temp_dir.path().join("uploads/alice");
        fs::create_dir_all(&old_upload).unwrap();
        fs::write(old_upload.join("a.txt"), b"A").unwrap();

        migrator.migrate("alice", "bob").unwrap();

        assert_eq!(
            fs::read(temp_dir.path().join("uploads/bob/a.txt")).unwrap(),
            b"A"
        );
        assert!(temp_dir.path().join("backups/bob").is_dir());
    }

    #[test]
    fn test_migrate_same_name_keeps_files() {
        let (_temp_dir, resolver, migrator) = setup();
        let store = FileStore::new(resolver);
        store.save("alice", "a.txt", b"A").unwrap();

        migrator.migrate("alice", "alice").unwrap();

        assert_eq!(store.read("alice", "a.txt").unwrap(), b"A");
    }

    #[test]
    fn test_migrate_onto_occupied_directory_is_storage_error() {
        let (_temp_dir, resolver, migrator) = setup();
        let store = FileStore::new(resolver);
        store.save("alice", "a.txt", b"A").unwrap();
        store.save("bob", "b.txt", b"B").unwrap();

        let result = migrator.migrate("alice", "bob");

        assert!(matches!(result, Err(FilenestError::Storage(_))));
        assert_eq!(store.read("alice", "a.txt").unwrap(), b"A");
    }

    #[test]
    fn test_migrate_blocked_backup_restores_uploads() {
        let (temp_dir, resolver, migrator) = setup();
        let store = FileStore::new(resolver.clone());
        store.save("alice", "secret.txt", b"alice data").unwrap();
        let blocker = temp_dir.path().join("backups/carol/x");
        fs::create_dir_all(&blocker).unwrap();

        let result = migrator.migrate("alice", "carol");

        assert!(matches!(result, Err(FilenestError::Storage(_))));
        assert!(!temp_dir.path().join("uploads/carol").exists());
        assert!(temp_dir.path().join("backups/alice").is_dir());
        assert_eq!(store.read("alice", "secret.txt").unwrap(), b"alice data");
        assert!(blocker.is_dir());
    }

    #[test]
    fn test_migrate_blocked_backup_removes_created_uploads() {
        let (temp_dir, _resolver, migrator) = setup();
        // Only a backup directory exists for alice, and carol's is occupied.
        fs::create_dir_all(temp_dir.path().join("backups/alice")).unwrap();
        fs::create_dir_all(temp_dir.path().join("backups/carol/x")).unwrap();

        let result = migrator.migrate("alice", "carol");

        assert!(matches!(result, Err(FilenestError::Storage(_))));
        assert!(!temp_dir.path().join("uploads/carol").exists());
    }

    #[test]
    fn test_migrate_leaves_no_lock_entries() {
        let (_temp_dir, resolver, migrator) = setup();

        migrator.migrate("alice", "bob").unwrap();

        assert!(resolver.locks().is_empty());
    }

    #[test]
    fn test_migrate_rejects_invalid_usernames() {
        let (_temp_dir, _resolver, migrator) = setup();

        assert!(matches!(
            migrator.migrate("alice", "../bob"),
            Err(FilenestError::Validation(_))
        ));
        assert!(matches!(
            migrator.migrate("", "bob"),
            Err(FilenestError::Validation(_))
        ));
    }
}
