//! SQLite-backed credential store.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use super::credentials::{hash_secret, new_stamp, user_not_found, user_taken, CredentialStore};
use super::password::verify_password;
use crate::{FilenestError, Result};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS credentials (
    username    TEXT PRIMARY KEY,
    secret_hash TEXT NOT NULL,
    stamp       INTEGER NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
)";

/// Credential store persisted in a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    /// Open (or create) the database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening credential database at {:?}", path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory credential database");
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // Each connection would get its own in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of stored users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credentials")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn exists(&self, username: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM credentials WHERE username = ?)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create(&self, username: &str, secret: &str) -> Result<()> {
        let hash = hash_secret(secret)?;

        let result = sqlx::query(
            "INSERT INTO credentials (username, secret_hash, stamp) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(&hash)
        .bind(new_stamp())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(user_taken(username)),
            Err(e) => Err(e.into()),
        }
    }

    async fn verify(&self, username: &str, secret: &str) -> Result<bool> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT secret_hash FROM credentials WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        Ok(hash.is_some_and(|hash| verify_password(secret, &hash).is_ok()))
    }

    async fn rename(&self, old_username: &str, new_username: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let old_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM credentials WHERE username = ?)")
                .bind(old_username)
                .fetch_one(&mut *tx)
                .await?;
        if !old_exists {
            return Err(user_not_found(old_username));
        }
        if old_username == new_username {
            return Ok(());
        }

        let result = sqlx::query(
            "UPDATE credentials SET username = ?, stamp = ?, updated_at = datetime('now') \
             WHERE username = ?",
        )
        .bind(new_username)
        .bind(new_stamp())
        .bind(old_username)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(user_taken(new_username))
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update_secret(&self, username: &str, new_secret: &str) -> Result<()> {
        let hash = hash_secret(new_secret)?;

        let result = sqlx::query(
            "UPDATE credentials SET secret_hash = ?, updated_at = datetime('now') WHERE username = ?",
        )
        .bind(&hash)
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(|e| FilenestError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(username));
        }
        Ok(())
    }

    async fn stamp(&self, username: &str) -> Result<Option<i64>> {
        let stamp: Option<i64> =
            sqlx::query_scalar("SELECT stamp FROM credentials WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_and_verify() {
        let store = SqliteCredentialStore::open_in_memory().await.unwrap();

        store.create("alice", "pw-alice").await.unwrap();

        assert!(store.exists("alice").await.unwrap());
        assert!(!store.exists("Alice").await.unwrap());
        assert!(store.verify("alice", "pw-alice").await.unwrap());
        assert!(!store.verify("alice", "wrong").await.unwrap());
        assert!(!store.verify("nobody", "pw-alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_secret_is_hashed() {
        let store = SqliteCredentialStore::open_in_memory().await.unwrap();
        store.create("alice", "plain-secret").await.unwrap();

        let stored: String =
            sqlx::query_scalar("SELECT secret_hash FROM credentials WHERE username = 'alice'")
                .fetch_one(store.pool())
                .await
                .unwrap();

        assert_ne!(stored, "plain-secret");
        assert!(stored.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_create_duplicate() {
        let store = SqliteCredentialStore::open_in_memory().await.unwrap();
        store.create("alice", "pw").await.unwrap();

        let result = store.create("alice", "other").await;

        assert!(matches!(result, Err(FilenestError::Conflict(_))));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rename() {
        let store = SqliteCredentialStore::open_in_memory().await.unwrap();
        store.create("alice", "pw").await.unwrap();
        store.create("carol", "pw").await.unwrap();

        store.rename("alice", "bob").await.unwrap();
        assert!(!store.exists("alice").await.unwrap());
        assert!(store.verify("bob", "pw").await.unwrap());

        assert!(matches!(
            store.rename("alice", "dave").await,
            Err(FilenestError::NotFound(_))
        ));
        assert!(matches!(
            store.rename("bob", "carol").await,
            Err(FilenestError::Conflict(_))
        ));
        assert!(store.rename("bob", "bob").await.is_ok());
    }

    #[tokio::test]
    async fn test_stamp_follows_renames() {
        let store = SqliteCredentialStore::open_in_memory().await.unwrap();
        store.create("alice", "pw").await.unwrap();
        let first = store.stamp("alice").await.unwrap().unwrap();

        store.update_secret("alice", "pw2").await.unwrap();
        assert_eq!(store.stamp("alice").await.unwrap(), Some(first));

        store.rename("alice", "bob").await.unwrap();
        assert_eq!(store.stamp("alice").await.unwrap(), None);
        assert_ne!(store.stamp("bob").await.unwrap(), Some(first));

        store.create("alice", "other").await.unwrap();
        assert_ne!(store.stamp("alice").await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_update_secret() {
        let store = SqliteCredentialStore::open_in_memory().await.unwrap();
        store.create("alice", "old").await.unwrap();

        store.update_secret("alice", "new").await.unwrap();

        assert!(store.verify("alice", "new").await.unwrap());
        assert!(!store.verify("alice", "old").await.unwrap());
        assert!(matches!(
            store.update_secret("nobody", "x").await,
            Err(FilenestError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_open_persists_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("users.db");

        {
            let store = SqliteCredentialStore::open(&path).await.unwrap();
            store.create("alice", "pw").await.unwrap();
            store.pool().close().await;
        }

        let store = SqliteCredentialStore::open(&path).await.unwrap();
        assert!(store.verify("alice", "pw").await.unwrap());
    }
}
