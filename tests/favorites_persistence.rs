//! Integration tests for favorites durability across application restarts.
//!
//! Each test uses its own database file under the system temp directory and
//! reopens it to simulate a new session.

use pretty_assertions::assert_eq;
use reel::favorites::{FavoritesStore, FAVORITES_KEY};
use reel::storage::Database;
use std::path::PathBuf;

/// Fresh database path; any file left by an earlier run is removed.
fn db_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("reel_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir.join("reel.db")
}

async fn open(path: &PathBuf) -> Database {
    Database::open(path.to_str().unwrap()).await.unwrap()
}

#[tokio::test]
async fn test_favorites_survive_restart() {
    let path = db_path("restart");

    {
        let db = open(&path).await;
        let store = FavoritesStore::load(db.clone()).await;
        assert!(store.toggle(550).await.unwrap());
        assert!(store.toggle(13).await.unwrap());
        assert!(store.toggle(680).await.unwrap());
        assert!(!store.toggle(13).await.unwrap());
        db.close().await;
    }

    let db = open(&path).await;
    let store = FavoritesStore::load(db).await;
    assert_eq!(store.ids(), vec![550, 680]);
    assert!(store.is_favorite(550));
    assert!(!store.is_favorite(13));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn test_toggle_pair_restores_persisted_value() {
    let path = db_path("toggle_pair");
    let db = open(&path).await;
    let store = FavoritesStore::load(db.clone()).await;

    store.toggle(1).await.unwrap();
    let before = db.get_preference(FAVORITES_KEY).await.unwrap();

    store.toggle(2).await.unwrap();
    store.toggle(2).await.unwrap();
    let after = db.get_preference(FAVORITES_KEY).await.unwrap();

    assert_eq!(before, after);
    assert_eq!(after.as_deref(), Some("[1]"));

    db.close().await;
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn test_corrupt_value_on_disk_starts_empty_and_recovers() {
    let path = db_path("corrupt");

    {
        let db = open(&path).await;
        db.set_preference(FAVORITES_KEY, "{not json").await.unwrap();
        db.close().await;
    }

    let db = open(&path).await;
    let store = FavoritesStore::load(db.clone()).await;
    assert!(store.is_empty());

    // The next toggle overwrites the corrupt value
    store.toggle(7).await.unwrap();
    assert_eq!(
        db.get_preference(FAVORITES_KEY).await.unwrap().as_deref(),
        Some("[7]")
    );

    db.close().await;
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn test_clear_persists_empty_set() {
    let path = db_path("clear");

    {
        let db = open(&path).await;
        let store = FavoritesStore::load(db.clone()).await;
        store.toggle(3).await.unwrap();
        store.clear().await.unwrap();
        db.close().await;
    }

    let db = open(&path).await;
    let store = FavoritesStore::load(db.clone()).await;
    assert!(store.is_empty());

    db.close().await;
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

/// `path` with a SQLite journal suffix appended.
fn journal(path: &PathBuf, suffix: &str) -> PathBuf {
    let mut name = path.clone().into_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[tokio::test]
async fn test_remove_files_after_unclean_exit_forgets_favorites() {
    let path = db_path("unclean_live");
    let crashed = db_path("unclean_copy");

    // Snapshot the files while the pool is still open, as a killed process
    // would leave them: committed rows may live only in the WAL
    let db = open(&path).await;
    let store = FavoritesStore::load(db.clone()).await;
    store.toggle(550).await.unwrap();
    store.toggle(680).await.unwrap();
    for suffix in ["", "-wal", "-shm"] {
        let from = journal(&path, suffix);
        if from.exists() {
            std::fs::copy(&from, journal(&crashed, suffix)).unwrap();
        }
    }
    db.close().await;
    assert!(journal(&crashed, "-wal").exists());

    assert!(Database::remove_files(&crashed).unwrap());
    assert!(!crashed.exists());
    assert!(!journal(&crashed, "-wal").exists());
    assert!(!journal(&crashed, "-shm").exists());

    let db = open(&crashed).await;
    let store = FavoritesStore::load(db.clone()).await;
    assert!(store.is_empty());
    assert_eq!(db.get_preference(FAVORITES_KEY).await.unwrap(), None);

    db.close().await;
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
    let _ = std::fs::remove_dir_all(crashed.parent().unwrap());
}
