//! The façade hosts talk to.
//!
//! [`CoreService`] wires the bridges from a [`CoreConfig`] into the library
//! store, the media catalog and the audio session, and exposes the operations
//! each screen needs.

use crate::error::{CoreError, Result};
use crate::lifecycle::spawn_lifecycle_watcher;
use crate::mini_player::MiniPlayer;
use bridge_traits::prompt::{ConfirmationPrompt, ConfirmationRequest};
use core_library::query::filter_by_title;
use core_library::{LibraryError, LibraryStore, MediaCatalog, Track};
use core_playback::{AudioSession, PlayOptions};
use core_runtime::config::{CoreConfig, SessionSettings};
use core_runtime::events::EventBus;
use core_runtime::logging::display_uri;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// One row of a track list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRow {
    pub track: Track,
    pub is_favorite: bool,
    /// Duration as `m:ss`.
    pub duration: String,
}

impl TrackRow {
    fn new(track: Track, is_favorite: bool) -> Self {
        let duration = track.formatted_duration();
        Self {
            track,
            is_favorite,
            duration,
        }
    }
}

fn rows(tracks: Vec<Track>, favorites: &HashSet<String>) -> Vec<TrackRow> {
    tracks
        .into_iter()
        .map(|track| {
            let is_favorite = favorites.contains(&track.uri);
            TrackRow::new(track, is_favorite)
        })
        .collect()
}

struct ServiceInner {
    events: EventBus,
    library: LibraryStore,
    catalog: Arc<MediaCatalog>,
    session: AudioSession,
    prompt: Arc<dyn ConfirmationPrompt>,
    settings: SessionSettings,
    lifecycle: CancellationToken,
}

impl Drop for ServiceInner {
    fn drop(&mut self) {
        self.lifecycle.cancel();
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<ServiceInner>,
}

impl CoreService {
    /// Build every component from `config`.
    ///
    /// Restores the last session when `restore_on_start` is set and starts
    /// watching the host lifecycle when an observer is configured.
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let settings = config.session;
        let events = EventBus::new(settings.event_buffer_size);
        let library = LibraryStore::new(Arc::clone(&config.key_value_store), events.clone());
        let catalog = Arc::new(MediaCatalog::new(
            config.media_library,
            settings.media_scan_limit,
        ));
        let session = AudioSession::builder(
            config.playback_factory,
            Arc::clone(&catalog),
            config.key_value_store,
        )
        .events(events.clone())
        .status_poll_interval(settings.status_poll_interval)
        .build();

        if settings.restore_on_start {
            session.restore().await;
        }

        let lifecycle = CancellationToken::new();
        if let Some(observer) = config.lifecycle_observer {
            spawn_lifecycle_watcher(observer, session.clone(), lifecycle.clone());
        }

        info!(
            poll_interval_ms = settings.status_poll_interval.as_millis() as u64,
            restore = settings.restore_on_start,
            "Core service ready"
        );

        Ok(Self {
            inner: Arc::new(ServiceInner {
                events,
                library,
                catalog,
                session,
                prompt: config.confirmation_prompt,
                settings,
                lifecycle,
            }),
        })
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn library(&self) -> &LibraryStore {
        &self.inner.library
    }

    pub fn catalog(&self) -> &MediaCatalog {
        &self.inner.catalog
    }

    pub fn session(&self) -> &AudioSession {
        &self.inner.session
    }

    pub fn settings(&self) -> SessionSettings {
        self.inner.settings
    }

    pub fn mini_player(&self) -> MiniPlayer {
        MiniPlayer::new(self.inner.session.clone())
    }

    /// Stop watching the lifecycle and release the playback handle.
    pub async fn shutdown(&self) {
        self.inner.lifecycle.cancel();
        self.inner.session.shutdown().await;
    }

    async fn confirm(&self, request: ConfirmationRequest) -> Result<()> {
        if self.inner.prompt.confirm(&request).await {
            Ok(())
        } else {
            debug!(title = %request.title, "Confirmation declined");
            Err(CoreError::Cancelled)
        }
    }

    // ------------------------------------------------------------------
    // Explore
    // ------------------------------------------------------------------

    /// Device tracks matching `query`, flagged with favorite membership.
    pub async fn explore(&self, query: &str) -> Result<Vec<TrackRow>> {
        let tracks = self.inner.catalog.search(query).await;
        let favorites = self.inner.library.favorite_uris().await?;
        Ok(rows(tracks, &favorites))
    }

    /// Rescan the device library.
    pub async fn refresh_library(&self) -> Result<Vec<TrackRow>> {
        let tracks = self.inner.catalog.refresh().await;
        let favorites = self.inner.library.favorite_uris().await?;
        Ok(rows(tracks.as_ref().clone(), &favorites))
    }

    /// Play `track` with `list` (the list the user tapped it in) as the
    /// playlist that next/previous navigate.
    pub async fn play(&self, track: Track, list: Vec<Track>) {
        self.inner
            .session
            .play(track, Some(list), PlayOptions::default())
            .await;
    }

    // ------------------------------------------------------------------
    // Favorites
    // ------------------------------------------------------------------

    pub async fn favorites(&self, query: &str) -> Result<Vec<TrackRow>> {
        let favorites = self.inner.library.favorites().await?;
        Ok(filter_by_title(&favorites, query)
            .into_iter()
            .map(|track| TrackRow::new(track, true))
            .collect())
    }

    /// Returns whether the track is a favorite afterwards.
    pub async fn toggle_favorite(&self, track: &Track) -> Result<bool> {
        Ok(self.inner.library.toggle_favorite(track).await?)
    }

    // ------------------------------------------------------------------
    // Playlists
    // ------------------------------------------------------------------

    pub async fn playlist_names(&self) -> Result<Vec<String>> {
        Ok(self.inner.library.playlist_names().await?)
    }

    /// Returns the stored (trimmed) name.
    pub async fn create_playlist(&self, name: &str) -> Result<String> {
        Ok(self.inner.library.create_playlist(name).await?)
    }

    pub async fn add_to_playlist(&self, name: &str, track: &Track) -> Result<bool> {
        Ok(self.inner.library.add_to_playlist(name, track).await?)
    }

    /// Delete a playlist after the user confirms.
    ///
    /// Returns `Ok(false)` for an unknown playlist without prompting.
    #[instrument(skip(self))]
    pub async fn delete_playlist(&self, name: &str) -> Result<bool> {
        if self.inner.library.playlist(name).await?.is_none() {
            return Ok(false);
        }

        self.confirm(ConfirmationRequest::new(
            "Delete playlist",
            format!("Are you sure you want to delete \"{}\"?", name),
            "Delete",
        ))
        .await?;

        Ok(self.inner.library.delete_playlist(name).await?)
    }

    // ------------------------------------------------------------------
    // Playlist detail
    // ------------------------------------------------------------------

    pub async fn playlist_tracks(&self, name: &str) -> Result<Vec<TrackRow>> {
        let tracks = self
            .inner
            .library
            .playlist(name)
            .await?
            .ok_or_else(|| LibraryError::playlist_not_found(name))?;
        let favorites = self.inner.library.favorite_uris().await?;
        Ok(rows(tracks, &favorites))
    }

    /// Remove a track from a playlist after the user confirms.
    ///
    /// Returns `Ok(false)` without prompting when the track is not in the
    /// playlist.
    #[instrument(skip(self), fields(uri = %display_uri(uri)))]
    pub async fn remove_from_playlist(&self, name: &str, uri: &str) -> Result<bool> {
        let tracks = self
            .inner
            .library
            .playlist(name)
            .await?
            .ok_or_else(|| LibraryError::playlist_not_found(name))?;
        if !tracks.iter().any(|t| t.uri == uri) {
            return Ok(false);
        }

        self.confirm(ConfirmationRequest::new(
            "Remove song",
            "Remove this song from the playlist?",
            "Remove",
        ))
        .await?;

        Ok(self.inner.library.remove_from_playlist(name, uri).await?)
    }

    // ------------------------------------------------------------------
    // Radio
    // ------------------------------------------------------------------

    pub async fn start_radio(&self) -> bool {
        self.inner.session.start_radio().await
    }

    pub async fn stop_radio(&self) {
        self.inner.session.stop_radio().await;
    }
}
