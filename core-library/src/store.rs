//! Favorites and playlists over the host key-value store.
//!
//! ## Consistency
//!
//! The store keeps an in-memory copy of both blobs, loaded on first use. A
//! mutation holds the cache lock for its whole read-modify-write cycle:
//!
//! 1. clone the affected structure and apply the change,
//! 2. write the full blob back to the key-value store,
//! 3. commit the clone to the cache.
//!
//! A failed write leaves the cache untouched, and two concurrent mutations can
//! never overwrite each other's changes.

use crate::codec::{self, PlaylistMap, FAVORITES_KEY, PLAYLISTS_KEY};
use crate::error::{LibraryError, Result};
use crate::models::Track;
use bridge_traits::storage::KeyValueStore;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use core_runtime::logging::display_uri;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Default)]
struct LibraryCache {
    loaded: bool,
    favorites: Vec<Track>,
    playlists: PlaylistMap,
}

/// Favorites list and named playlists.
pub struct LibraryStore {
    store: Arc<dyn KeyValueStore>,
    events: EventBus,
    cache: Mutex<LibraryCache>,
}

impl LibraryStore {
    pub fn new(store: Arc<dyn KeyValueStore>, events: EventBus) -> Self {
        Self {
            store,
            events,
            cache: Mutex::new(LibraryCache::default()),
        }
    }

    async fn lock_loaded(&self) -> Result<MutexGuard<'_, LibraryCache>> {
        let mut cache = self.cache.lock().await;
        if !cache.loaded {
            self.load_into(&mut cache).await?;
        }
        Ok(cache)
    }

    async fn load_into(&self, cache: &mut LibraryCache) -> Result<()> {
        let favorites = self.store.get_string(FAVORITES_KEY).await?;
        let playlists = self.store.get_string(PLAYLISTS_KEY).await?;

        cache.favorites = codec::decode_favorites(favorites.as_deref());
        cache.playlists = codec::decode_playlists(playlists.as_deref());
        cache.loaded = true;

        debug!(
            favorites = cache.favorites.len(),
            playlists = cache.playlists.len(),
            "Loaded library from store"
        );
        Ok(())
    }

    /// Discard the cache and read both blobs again.
    pub async fn reload(&self) -> Result<()> {
        let mut cache = self.cache.lock().await;
        self.load_into(&mut cache).await
    }

    async fn write_favorites(&self, favorites: &[Track]) -> Result<()> {
        let json = codec::encode_tracks(favorites)?;
        self.store.set_string(FAVORITES_KEY, &json).await?;
        Ok(())
    }

    async fn write_playlists(&self, playlists: &PlaylistMap) -> Result<()> {
        let json = codec::encode_playlists(playlists)?;
        self.store.set_string(PLAYLISTS_KEY, &json).await?;
        Ok(())
    }

    fn emit(&self, event: LibraryEvent) {
        // No subscribers is fine
        let _ = self.events.emit(CoreEvent::Library(event));
    }

    // ------------------------------------------------------------------
    // Favorites
    // ------------------------------------------------------------------

    pub async fn favorites(&self) -> Result<Vec<Track>> {
        Ok(self.lock_loaded().await?.favorites.clone())
    }

    pub async fn favorite_uris(&self) -> Result<HashSet<String>> {
        let cache = self.lock_loaded().await?;
        Ok(cache.favorites.iter().map(|t| t.uri.clone()).collect())
    }

    pub async fn is_favorite(&self, uri: &str) -> Result<bool> {
        let cache = self.lock_loaded().await?;
        Ok(cache.favorites.iter().any(|t| t.uri == uri))
    }

    /// Add the track to favorites, or remove it if already there.
    ///
    /// Returns whether the track is a favorite afterwards.
    pub async fn toggle_favorite(&self, track: &Track) -> Result<bool> {
        let mut cache = self.lock_loaded().await?;

        let mut favorites = cache.favorites.clone();
        let was_favorite = favorites.iter().any(|t| t.same_track(track));
        if was_favorite {
            favorites.retain(|t| !t.same_track(track));
        } else {
            favorites.push(track.clone());
        }

        self.write_favorites(&favorites).await?;
        cache.favorites = favorites;
        drop(cache);

        let uri = track.uri.clone();
        if was_favorite {
            debug!(uri = %display_uri(&uri), "Removed favorite");
            self.emit(LibraryEvent::FavoriteRemoved { uri });
        } else {
            debug!(uri = %display_uri(&uri), "Added favorite");
            self.emit(LibraryEvent::FavoriteAdded { uri });
        }

        Ok(!was_favorite)
    }

    /// Remove a favorite by URI. Returns `false` when it was not a favorite.
    pub async fn remove_favorite(&self, uri: &str) -> Result<bool> {
        let mut cache = self.lock_loaded().await?;
        if !cache.favorites.iter().any(|t| t.uri == uri) {
            return Ok(false);
        }

        let favorites: Vec<Track> = cache
            .favorites
            .iter()
            .filter(|t| t.uri != uri)
            .cloned()
            .collect();

        self.write_favorites(&favorites).await?;
        cache.favorites = favorites;
        drop(cache);

        self.emit(LibraryEvent::FavoriteRemoved {
            uri: uri.to_string(),
        });
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Playlists
    // ------------------------------------------------------------------

    /// Playlist names in name order.
    pub async fn playlist_names(&self) -> Result<Vec<String>> {
        let cache = self.lock_loaded().await?;
        Ok(cache.playlists.keys().cloned().collect())
    }

    /// Tracks of a playlist in play order, `None` if it does not exist.
    pub async fn playlist(&self, name: &str) -> Result<Option<Vec<Track>>> {
        let cache = self.lock_loaded().await?;
        Ok(cache.playlists.get(name).cloned())
    }

    /// Create an empty playlist and return its trimmed name.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the name is empty or only whitespace
    /// - `AlreadyExists` if a playlist with that name exists
    pub async fn create_playlist(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "name".to_string(),
                message: "Playlist name cannot be empty".to_string(),
            });
        }

        let mut cache = self.lock_loaded().await?;
        if cache.playlists.contains_key(name) {
            return Err(LibraryError::AlreadyExists {
                entity_type: "Playlist".to_string(),
                id: name.to_string(),
            });
        }

        let mut playlists = cache.playlists.clone();
        playlists.insert(name.to_string(), Vec::new());

        self.write_playlists(&playlists).await?;
        cache.playlists = playlists;
        drop(cache);

        info!(playlist = name, "Created playlist");
        self.emit(LibraryEvent::PlaylistCreated {
            name: name.to_string(),
        });
        Ok(name.to_string())
    }

    /// Delete a playlist. Returns `false` when it did not exist.
    pub async fn delete_playlist(&self, name: &str) -> Result<bool> {
        let mut cache = self.lock_loaded().await?;
        if !cache.playlists.contains_key(name) {
            return Ok(false);
        }

        let mut playlists = cache.playlists.clone();
        playlists.remove(name);

        self.write_playlists(&playlists).await?;
        cache.playlists = playlists;
        drop(cache);

        info!(playlist = name, "Deleted playlist");
        self.emit(LibraryEvent::PlaylistDeleted {
            name: name.to_string(),
        });
        Ok(true)
    }

    /// Append a track to a playlist.
    ///
    /// Returns `false` without writing if the URI is already in the playlist.
    ///
    /// # Errors
    ///
    /// `NotFound` if the playlist does not exist.
    pub async fn add_to_playlist(&self, name: &str, track: &Track) -> Result<bool> {
        let mut cache = self.lock_loaded().await?;
        let Some(tracks) = cache.playlists.get(name) else {
            return Err(LibraryError::playlist_not_found(name));
        };

        if tracks.iter().any(|t| t.same_track(track)) {
            debug!(playlist = name, "Track already in playlist");
            return Ok(false);
        }

        let mut playlists = cache.playlists.clone();
        playlists
            .entry(name.to_string())
            .or_default()
            .push(track.clone());

        self.write_playlists(&playlists).await?;
        cache.playlists = playlists;
        drop(cache);

        self.emit(LibraryEvent::PlaylistTrackAdded {
            name: name.to_string(),
            uri: track.uri.clone(),
        });
        Ok(true)
    }

    /// Remove every entry with `uri` from a playlist.
    ///
    /// Returns `false` when the playlist did not contain it.
    ///
    /// # Errors
    ///
    /// `NotFound` if the playlist does not exist.
    pub async fn remove_from_playlist(&self, name: &str, uri: &str) -> Result<bool> {
        let mut cache = self.lock_loaded().await?;
        let Some(tracks) = cache.playlists.get(name) else {
            return Err(LibraryError::playlist_not_found(name));
        };

        if !tracks.iter().any(|t| t.uri == uri) {
            return Ok(false);
        }

        let remaining: Vec<Track> = tracks.iter().filter(|t| t.uri != uri).cloned().collect();
        let mut playlists = cache.playlists.clone();
        playlists.insert(name.to_string(), remaining);

        self.write_playlists(&playlists).await?;
        cache.playlists = playlists;
        drop(cache);

        self.emit(LibraryEvent::PlaylistTrackRemoved {
            name: name.to_string(),
            uri: uri.to_string(),
        });
        Ok(true)
    }
}
