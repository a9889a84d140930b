//! Integration tests for favorites and playlists persistence

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::storage::{KeyValueStore, MemoryKeyValueStore};
use core_library::codec::{FAVORITES_KEY, PLAYLISTS_KEY};
use core_library::{LibraryError, LibraryStore, Track};
use core_runtime::events::EventBus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn track(uri: &str) -> Track {
    Track::new(format!("{}.mp3", uri), uri, 100.0)
}

fn store_with(entries: Vec<(&str, &str)>) -> (Arc<MemoryKeyValueStore>, LibraryStore) {
    let kv = Arc::new(MemoryKeyValueStore::with_entries(entries));
    let library = LibraryStore::new(kv.clone(), EventBus::default());
    (kv, library)
}

fn stored_uris(raw: &str, playlist: &str) -> Vec<String> {
    let value: serde_json::Value = serde_json::from_str(raw).unwrap();
    value[playlist]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["uri"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_add_to_existing_playlist_appends() {
    let (kv, library) = store_with(vec![(
        PLAYLISTS_KEY,
        r#"{"Gym":[{"title":"u1.mp3","uri":"u1","duration":100}]}"#,
    )]);

    assert!(library.add_to_playlist("Gym", &track("u2")).await.unwrap());

    let raw = kv.get_string(PLAYLISTS_KEY).await.unwrap().unwrap();
    assert_eq!(stored_uris(&raw, "Gym"), vec!["u1", "u2"]);
}

#[tokio::test]
async fn test_add_same_track_twice_keeps_one_entry() {
    let (kv, library) = store_with(vec![]);
    library.create_playlist("Chill").await.unwrap();

    assert!(library.add_to_playlist("Chill", &track("u1")).await.unwrap());
    assert!(!library.add_to_playlist("Chill", &track("u1")).await.unwrap());

    let raw = kv.get_string(PLAYLISTS_KEY).await.unwrap().unwrap();
    assert_eq!(stored_uris(&raw, "Chill"), vec!["u1"]);
}

#[tokio::test]
async fn test_add_to_unknown_playlist_is_not_found() {
    let (_kv, library) = store_with(vec![]);
    let result = library.add_to_playlist("Nope", &track("u1")).await;
    assert!(matches!(result, Err(LibraryError::NotFound { .. })));
}

#[tokio::test]
async fn test_favorites_toggle_twice_restores_membership() {
    let (kv, library) = store_with(vec![(FAVORITES_KEY, "[]")]);

    library.toggle_favorite(&track("u1")).await.unwrap();
    assert!(library.is_favorite("u1").await.unwrap());
    let raw = kv.get_string(FAVORITES_KEY).await.unwrap().unwrap();
    assert!(raw.contains("\"u1\""));

    library.toggle_favorite(&track("u1")).await.unwrap();
    assert!(!library.is_favorite("u1").await.unwrap());
    assert_eq!(kv.get_string(FAVORITES_KEY).await.unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_malformed_blobs_read_as_defaults() {
    let (_kv, library) = store_with(vec![
        (FAVORITES_KEY, "{not json"),
        (PLAYLISTS_KEY, "{not json"),
    ]);

    assert!(library.favorites().await.unwrap().is_empty());
    assert!(library.playlist_names().await.unwrap().is_empty());

    // The store recovers on the next write
    library.create_playlist("Fresh").await.unwrap();
    assert_eq!(library.playlist_names().await.unwrap(), vec!["Fresh"]);
}

#[tokio::test]
async fn test_delete_and_remove_song() {
    let (kv, library) = store_with(vec![]);
    library.create_playlist("Road").await.unwrap();
    library.add_to_playlist("Road", &track("u1")).await.unwrap();
    library.add_to_playlist("Road", &track("u2")).await.unwrap();

    assert!(library.remove_from_playlist("Road", "u1").await.unwrap());
    assert!(!library.remove_from_playlist("Road", "u1").await.unwrap());
    let raw = kv.get_string(PLAYLISTS_KEY).await.unwrap().unwrap();
    assert_eq!(stored_uris(&raw, "Road"), vec!["u2"]);

    assert!(library.delete_playlist("Road").await.unwrap());
    assert!(!library.delete_playlist("Road").await.unwrap());
    assert_eq!(
        kv.get_string(PLAYLISTS_KEY).await.unwrap().as_deref(),
        Some("{}")
    );
}

#[tokio::test]
async fn test_playlist_names_sorted() {
    let (_kv, library) = store_with(vec![]);
    library.create_playlist("Zen").await.unwrap();
    library.create_playlist("Acoustic").await.unwrap();
    library.create_playlist("Metal").await.unwrap();

    assert_eq!(
        library.playlist_names().await.unwrap(),
        vec!["Acoustic", "Metal", "Zen"]
    );
}

#[tokio::test]
async fn test_concurrent_mutations_do_not_lose_writes() {
    let (kv, library) = store_with(vec![]);
    let library = Arc::new(library);
    library.create_playlist("Party").await.unwrap();

    let mut handles = Vec::new();
    for i in 0..20 {
        let library = Arc::clone(&library);
        handles.push(tokio::spawn(async move {
            let uri = format!("u{}", i);
            library.add_to_playlist("Party", &track(&uri)).await.unwrap();
            library.toggle_favorite(&track(&uri)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let raw = kv.get_string(PLAYLISTS_KEY).await.unwrap().unwrap();
    assert_eq!(stored_uris(&raw, "Party").len(), 20);
    assert_eq!(library.favorites().await.unwrap().len(), 20);
}

#[tokio::test]
async fn test_reload_picks_up_external_changes() {
    let (kv, library) = store_with(vec![]);
    assert!(library.favorites().await.unwrap().is_empty());

    kv.set_string(FAVORITES_KEY, r#"[{"title":"x","uri":"u7"}]"#)
        .await
        .unwrap();
    assert!(library.favorites().await.unwrap().is_empty());

    library.reload().await.unwrap();
    assert!(library.is_favorite("u7").await.unwrap());
}

/// Store whose writes can be switched off.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryKeyValueStore,
    fail_writes: AtomicBool,
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        self.inner.get_string(key).await
    }

    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("disk full".to_string()));
        }
        self.inner.set_string(key, value).await
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.inner.delete(key).await
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        self.inner.list_keys().await
    }
}

#[tokio::test]
async fn test_failed_write_leaves_cache_unchanged() {
    let kv = Arc::new(FlakyStore::default());
    let library = LibraryStore::new(kv.clone(), EventBus::default());
    library.toggle_favorite(&track("u1")).await.unwrap();

    kv.fail_writes.store(true, Ordering::SeqCst);
    let result = library.toggle_favorite(&track("u2")).await;
    assert!(matches!(result, Err(LibraryError::Bridge(_))));

    let favorites = library.favorites().await.unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].uri, "u1");
}
