//! Per-user file and snapshot storage.
//!
//! This module provides:
//! - Namespace resolution (username to upload and backup directories)
//! - File operations scoped to one namespace
//! - Dated snapshots and wholesale restore
//! - Directory migration on username change
//!
//! All filesystem work is synchronous. Operations that write to a namespace
//! hold that namespace's lock for their duration.

mod files;
mod lock;
mod migrate;
mod namespace;
mod snapshot;
mod validation;

pub use files::{extension_of, FileStore, StoredFile};
pub use lock::NamespaceLocks;
pub use migrate::AccountDirectoryMigrator;
pub use namespace::{Namespace, NamespaceResolver};
pub use snapshot::{parse_snapshot_date, SnapshotManager};
pub use validation::{validate_file_name, validate_username, SegmentError, MAX_SEGMENT_LENGTH};
