use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::{is_lock_message, DatabaseError};

const IN_MEMORY: &str = ":memory:";

/// How long a connection waits on a lock held by another writer.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Database
// ============================================================================

/// Handle to the preference database. Clones share one pool.
#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `path` and migrate it.
    ///
    /// `":memory:"` opens a private database that lives as long as the handle.
    ///
    /// # Errors
    ///
    /// `DatabaseError::InstanceLocked` when another reel process holds the
    /// file, `DatabaseError::Migration` when the schema cannot be created.
    pub async fn open(path: &str) -> Result<Self, DatabaseError> {
        let in_memory = path == IN_MEMORY;

        #[cfg(unix)]
        if !in_memory {
            restrict_permissions(Path::new(path));
        }

        let pool = SqlitePoolOptions::new()
            // Every connection to ":memory:" would get its own empty database
            .max_connections(if in_memory { 1 } else { 4 })
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(connect_options(path, in_memory))
            .await
            .map_err(DatabaseError::from_sqlx)?;

        let db = Self { pool };
        db.migrate().await.map_err(|e| {
            let message = e.to_string();
            if is_lock_message(&message) {
                DatabaseError::InstanceLocked
            } else {
                DatabaseError::Migration(message)
            }
        })?;

        tracing::debug!(path, "Opened preference database");
        Ok(db)
    }

    /// Close every pooled connection, flushing pending writes.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Delete the database at `path` along with its `-wal` and `-shm` files.
    ///
    /// A WAL left by a process that did not shut down cleanly still holds
    /// committed rows; removing only the main file would let them reappear
    /// on the next open. Returns whether anything was deleted.
    pub fn remove_files(path: &Path) -> std::io::Result<bool> {
        let mut removed = false;
        for file in [path.to_path_buf(), sibling(path, "-wal"), sibling(path, "-shm")] {
            match std::fs::remove_file(&file) {
                Ok(()) => {
                    tracing::debug!(path = %file.display(), "Removed database file");
                    removed = true;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(removed)
    }

    /// Create the schema. Safe to run on an existing database.
    async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// `path` with `suffix` appended to the file name, as SQLite names its
/// journal files.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn connect_options(path: &str, in_memory: bool) -> SqliteConnectOptions {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .busy_timeout(BUSY_TIMEOUT);

    if in_memory {
        options.in_memory(true)
    } else {
        options.journal_mode(SqliteJournalMode::Wal)
    }
}

/// Keep the database file user-only: it records what the user watches.
///
/// A new file is created with mode 0600 up front so it never exists with the
/// default umask. Failures are logged; SQLite reports anything fatal itself.
#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    if path.exists() {
        if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to set database file permissions");
        }
        return;
    }

    let parent_exists = path.parent().map_or(true, |p| p.as_os_str().is_empty() || p.exists());
    if parent_exists {
        let created = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(path);
        if let Err(e) = created {
            tracing::debug!(path = %path.display(), error = %e, "Could not pre-create database file");
        }
    }
}
