//! Persisted set of favorited movie identifiers.
//!
//! The set lives under a single preference key as a JSON array of integers.
//! Every toggle writes the new set to the database before the in-memory copy
//! changes, so the in-memory set never claims a favorite that is not durable.
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

use crate::storage::{Database, JsonPreference};

/// Preference key holding the persisted favorites array.
pub const FAVORITES_KEY: &str = "favorites";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum FavoritesError {
    /// Durable write failed; the in-memory set was left unchanged.
    #[error("Could not save favorites: {0}")]
    Storage(String),
}

// ============================================================================
// FavoritesStore
// ============================================================================

struct Inner {
    db: Database,
    /// Snapshot served to readers. Replaced only after a successful write.
    ids: RwLock<HashSet<i64>>,
    /// Serializes toggles so two racing writers never persist stale sets.
    write_gate: tokio::sync::Mutex<()>,
}

/// Shared handle to the favorites set.
///
/// Cloning is cheap; all clones observe the same set. Queries never wait on
/// a pending toggle: they see the last committed snapshot.
#[derive(Clone)]
pub struct FavoritesStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for FavoritesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesStore")
            .field("len", &self.len())
            .finish()
    }
}

impl FavoritesStore {
    /// Load the persisted set.
    ///
    /// Never fails: a missing key, an unreadable database or a malformed value
    /// all start the session with an empty set. Duplicate ids collapse.
    pub async fn load(db: Database) -> Self {
        let ids: HashSet<i64> = match db.read_json_preference::<Vec<i64>>(FAVORITES_KEY).await {
            Ok(JsonPreference::Value(ids)) => ids.into_iter().collect(),
            Ok(JsonPreference::Absent) => HashSet::new(),
            Ok(JsonPreference::Malformed(e)) => {
                tracing::warn!(error = %e, "Malformed persisted favorites, starting empty");
                HashSet::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted favorites, starting empty");
                HashSet::new()
            }
        };

        tracing::debug!(count = ids.len(), "Loaded favorites");

        Self {
            inner: Arc::new(Inner {
                db,
                ids: RwLock::new(ids),
                write_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Whether `id` is in the last committed set.
    pub fn is_favorite(&self, id: i64) -> bool {
        self.read_snapshot(|ids| ids.contains(&id))
    }

    /// Flip membership of `id` and return the new membership.
    ///
    /// # Errors
    ///
    /// [`FavoritesError::Storage`] when the write fails. The set is unchanged
    /// in that case, so the caller can simply report the failure.
    pub async fn toggle(&self, id: i64) -> Result<bool, FavoritesError> {
        let _gate = self.inner.write_gate.lock().await;

        let mut next = self.read_snapshot(HashSet::clone);
        let now_favorite = if next.remove(&id) {
            false
        } else {
            next.insert(id);
            true
        };

        self.persist(&next).await?;
        self.replace_snapshot(next);

        tracing::debug!(movie_id = id, favorite = now_favorite, "Toggled favorite");
        Ok(now_favorite)
    }

    /// Remove every favorite.
    pub async fn clear(&self) -> Result<(), FavoritesError> {
        let _gate = self.inner.write_gate.lock().await;

        let empty = HashSet::new();
        self.persist(&empty).await?;
        self.replace_snapshot(empty);
        Ok(())
    }

    /// Committed identifiers in ascending order.
    pub fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.read_snapshot(|ids| ids.iter().copied().collect());
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.read_snapshot(HashSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    /// Write `ids` as a sorted JSON array, so the stored value is stable.
    async fn persist(&self, ids: &HashSet<i64>) -> Result<(), FavoritesError> {
        let mut sorted: Vec<i64> = ids.iter().copied().collect();
        sorted.sort_unstable();

        self.inner
            .db
            .write_json_preference(FAVORITES_KEY, &sorted)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to persist favorites");
                FavoritesError::Storage(e.to_string())
            })
    }

    fn read_snapshot<T>(&self, f: impl FnOnce(&HashSet<i64>) -> T) -> T {
        // A poisoned lock still holds the last committed set
        let guard = self
            .inner
            .ids
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn replace_snapshot(&self, ids: HashSet<i64>) {
        let mut guard = self
            .inner
            .ids
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = ids;
    }
}
