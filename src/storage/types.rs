use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors from the preference database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another reel process holds the database.
    #[error("Another instance of reel appears to be running. Please close it and try again.")]
    InstanceLocked,

    #[error("Database migration failed: {0}")]
    Migration(String),

    /// A preference value could not be serialized for storage.
    #[error("Could not encode preference '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Classify a sqlx error, recognizing lock contention.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            DatabaseError::InstanceLocked
        } else {
            DatabaseError::Other(err)
        }
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) messages.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}

// ============================================================================
// Stored Values
// ============================================================================

/// A JSON preference as read back from the database.
///
/// A value that no longer decodes is reported, not treated as an I/O error,
/// so callers can fall back to a default and keep running.
#[derive(Debug)]
pub enum JsonPreference<T> {
    Absent,
    Value(T),
    Malformed(serde_json::Error),
}
