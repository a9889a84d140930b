//! Audio session: the single owner of the live playback handle.
//!
//! Every transport operation takes the session lock and holds it across
//! release, acquire and persist, so two concurrent `play` calls can never both
//! end up with a live handle. Failures are absorbed: they are logged, emitted
//! as [`PlaybackEvent::Error`] and leave the session in a consistent state.

use crate::error::{PlaybackError, Result};
use crate::radio::{pick_track, RandomPicker, TrackPicker};
use crate::snapshot::SnapshotStore;
use crate::state::NowPlaying;
use crate::watcher::spawn_status_watcher;
use bridge_traits::playback::{
    AcquireOptions, PlaybackHandle, PlaybackHandleFactory, PlaybackHandleId, PlaybackStatus,
};
use bridge_traits::storage::KeyValueStore;
use core_library::{MediaCatalog, Track};
use core_runtime::config::DEFAULT_STATUS_POLL_INTERVAL;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use core_runtime::logging::display_uri;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

/// Maximum number of entries kept by [`AudioSession::history`].
pub const HISTORY_LIMIT: usize = 50;

/// How a track is being started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayOptions {
    /// Start in radio mode: loop the stream and pick a random successor.
    pub radio: bool,
}

impl PlayOptions {
    pub fn radio() -> Self {
        Self { radio: true }
    }
}

struct LoadedHandle {
    id: PlaybackHandleId,
    handle: Arc<dyn PlaybackHandle>,
    watcher: CancellationToken,
}

#[derive(Default)]
struct SessionState {
    current_track: Option<Track>,
    active_playlist: Vec<Track>,
    is_playing: bool,
    is_radio: bool,
    handle: Option<LoadedHandle>,
    history: VecDeque<Track>,
}

impl SessionState {
    fn handle_id(&self) -> Option<PlaybackHandleId> {
        self.handle.as_ref().map(|loaded| loaded.id)
    }

    fn current_uri(&self) -> Option<String> {
        self.current_track.as_ref().map(|t| t.uri.clone())
    }

    fn playlist_position(&self) -> Option<usize> {
        let current = self.current_track.as_ref()?;
        self.active_playlist
            .iter()
            .position(|t| t.same_track(current))
    }

    /// `(has_previous, has_next)`
    fn neighbours(&self) -> (bool, bool) {
        if self.is_radio {
            return (false, true);
        }
        match self.playlist_position() {
            Some(index) => (index > 0, index + 1 < self.active_playlist.len()),
            None => (false, false),
        }
    }

    fn remember(&mut self, track: Track) {
        if self
            .history
            .front()
            .is_some_and(|last| last.same_track(&track))
        {
            return;
        }
        self.history.push_front(track);
        self.history.truncate(HISTORY_LIMIT);
    }
}

struct SessionInner {
    factory: Arc<dyn PlaybackHandleFactory>,
    catalog: Arc<MediaCatalog>,
    snapshots: SnapshotStore,
    picker: Arc<dyn TrackPicker>,
    events: EventBus,
    poll_interval: Duration,
    state: Mutex<SessionState>,
    now_playing: watch::Sender<NowPlaying>,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if let Some(loaded) = self.state.get_mut().handle.take() {
            loaded.watcher.cancel();
        }
    }
}

/// Builder for [`AudioSession`].
pub struct AudioSessionBuilder {
    factory: Arc<dyn PlaybackHandleFactory>,
    catalog: Arc<MediaCatalog>,
    store: Arc<dyn KeyValueStore>,
    events: Option<EventBus>,
    picker: Option<Arc<dyn TrackPicker>>,
    poll_interval: Duration,
}

impl AudioSessionBuilder {
    /// Bus for [`PlaybackEvent`]s. A private bus is created when unset.
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Radio picker. Defaults to [`RandomPicker`].
    pub fn picker(mut self, picker: Arc<dyn TrackPicker>) -> Self {
        self.picker = Some(picker);
        self
    }

    /// Polling interval for hosts without pushed status.
    pub fn status_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn build(self) -> AudioSession {
        let (now_playing, _) = watch::channel(NowPlaying::default());
        AudioSession {
            inner: Arc::new(SessionInner {
                factory: self.factory,
                catalog: self.catalog,
                snapshots: SnapshotStore::new(self.store),
                picker: self.picker.unwrap_or_else(|| Arc::new(RandomPicker)),
                events: self.events.unwrap_or_default(),
                poll_interval: self.poll_interval,
                state: Mutex::new(SessionState::default()),
                now_playing,
            }),
        }
    }
}

/// Playback controller shared by every screen.
///
/// Cheap to clone; clones drive the same session.
#[derive(Clone)]
pub struct AudioSession {
    inner: Arc<SessionInner>,
}

impl AudioSession {
    pub fn builder(
        factory: Arc<dyn PlaybackHandleFactory>,
        catalog: Arc<MediaCatalog>,
        store: Arc<dyn KeyValueStore>,
    ) -> AudioSessionBuilder {
        AudioSessionBuilder {
            factory,
            catalog,
            store,
            events: None,
            picker: None,
            poll_interval: DEFAULT_STATUS_POLL_INTERVAL,
        }
    }

    /// Current state.
    pub fn now_playing(&self) -> NowPlaying {
        self.inner.now_playing.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<NowPlaying> {
        self.inner.now_playing.subscribe()
    }

    /// Playlist that next/previous navigate.
    pub async fn active_playlist(&self) -> Vec<Track> {
        self.inner.state.lock().await.active_playlist.clone()
    }

    /// Recently started tracks, newest first.
    pub async fn history(&self) -> Vec<Track> {
        self.inner
            .state
            .lock()
            .await
            .history
            .iter()
            .cloned()
            .collect()
    }

    /// Play `track`.
    ///
    /// A non-empty `playlist` replaces the active playlist. Playing the track
    /// that is already playing in the same mode is a no-op; switching between
    /// radio and normal mode reacquires it. On acquire failure the current
    /// track and playlist are left untouched and `is_playing` turns false.
    #[instrument(skip_all, fields(uri = %display_uri(&track.uri), radio = options.radio))]
    pub async fn play(&self, track: Track, playlist: Option<Vec<Track>>, options: PlayOptions) {
        let mut state = self.inner.state.lock().await;
        self.inner
            .play_locked(&mut state, track, playlist, options.radio)
            .await;
    }

    #[instrument(skip(self))]
    pub async fn pause(&self) {
        self.inner.pause().await;
    }

    /// Resume the loaded handle. No-op when nothing is loaded.
    #[instrument(skip(self))]
    pub async fn resume(&self) {
        self.inner.resume(false).await;
    }

    /// Pause when playing, otherwise resume.
    ///
    /// With nothing loaded but a current track set (restored paused, or
    /// released on suspension) the track is acquired again.
    #[instrument(skip(self))]
    pub async fn toggle_play_pause(&self) {
        if self.inner.state.lock().await.is_playing {
            self.inner.pause().await;
        } else {
            self.inner.resume(true).await;
        }
    }

    /// Next track in the active playlist, or a random one in radio mode.
    #[instrument(skip(self))]
    pub async fn play_next(&self) {
        self.inner.play_next().await;
    }

    /// Previous track in the active playlist. No-op in radio mode.
    #[instrument(skip(self))]
    pub async fn play_previous(&self) {
        self.inner.play_previous().await;
    }

    /// Drop the current stream and play a random device track in radio mode.
    ///
    /// Returns `false` when the library is empty or the acquire failed.
    #[instrument(skip(self))]
    pub async fn start_radio(&self) -> bool {
        self.inner.start_radio().await
    }

    /// Release the stream and leave radio mode. The current track is cleared.
    #[instrument(skip(self))]
    pub async fn stop_radio(&self) {
        self.inner.stop_radio().await;
    }

    /// Replace the playlist used for next/previous without touching playback.
    pub async fn set_active_playlist(&self, playlist: Vec<Track>) {
        let mut state = self.inner.state.lock().await;
        state.active_playlist = playlist;
        self.inner.publish(&state);
    }

    /// Reapply the persisted snapshot.
    ///
    /// The last song becomes current. If audio was playing it is reacquired,
    /// or a fresh random track is started when radio was on.
    #[instrument(skip(self))]
    pub async fn restore(&self) {
        self.inner.restore().await;
    }

    /// Release the live handle (host suspension or teardown).
    ///
    /// The current track and playlist are kept so a later `play` or
    /// `resume` works. The persisted snapshot is left as it was, so a
    /// restart restores what the user was doing.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        self.inner.shutdown().await;
    }

    /// Event bus the session emits on.
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }
}

impl SessionInner {
    fn emit(&self, event: PlaybackEvent) {
        // Nobody listening is fine.
        let _ = self.events.emit(CoreEvent::Playback(event));
    }

    fn emit_error(&self, uri: Option<String>, err: &PlaybackError) {
        self.emit(PlaybackEvent::Error {
            uri,
            message: err.to_string(),
            recoverable: err.is_recoverable(),
        });
    }

    fn publish(&self, state: &SessionState) {
        let handle_id = state.handle_id();
        let (has_previous, has_next) = state.neighbours();
        self.now_playing.send_modify(|np| {
            if np.handle_id != handle_id {
                np.progress = PlaybackStatus::default();
            }
            np.handle_id = handle_id;
            np.track = state.current_track.clone();
            np.is_playing = state.is_playing;
            np.is_radio = state.is_radio;
            np.has_previous = has_previous;
            np.has_next = has_next;
        });
    }

    async fn release_locked(&self, state: &mut SessionState) {
        if let Some(loaded) = state.handle.take() {
            loaded.watcher.cancel();
            if let Err(err) = loaded.handle.stop().await {
                debug!(error = %err, "Stop before release failed");
            }
            if let Err(err) = loaded.handle.release().await {
                warn!(error = %err, "Failed to release playback handle");
            }
            trace!(handle = %loaded.id.as_uuid(), "Released playback handle");
        }
        state.is_playing = false;
    }

    async fn acquire(self: &Arc<Self>, track: &Track, radio: bool) -> Result<LoadedHandle> {
        let options = AcquireOptions::new(true, radio);
        let handle: Arc<dyn PlaybackHandle> =
            Arc::from(self.factory.acquire(&track.uri, options).await?);
        let id = PlaybackHandleId::new();
        let watcher = CancellationToken::new();

        let weak = Arc::downgrade(self);
        spawn_status_watcher(
            Arc::clone(&handle),
            self.poll_interval,
            watcher.clone(),
            move |status| match weak.upgrade() {
                Some(inner) => {
                    inner.on_status(id, status);
                    true
                }
                None => false,
            },
        );

        Ok(LoadedHandle {
            id,
            handle,
            watcher,
        })
    }

    /// Returns whether a new stream was started.
    ///
    /// Replaying the current track only short-circuits when the radio flag
    /// matches, because the handle's looping mode depends on it.
    async fn play_locked(
        self: &Arc<Self>,
        state: &mut SessionState,
        track: Track,
        playlist: Option<Vec<Track>>,
        radio: bool,
    ) -> bool {
        let already_playing = state.is_playing
            && state.is_radio == radio
            && state.handle.is_some()
            && state
                .current_track
                .as_ref()
                .is_some_and(|current| current.same_track(&track));
        if already_playing {
            debug!("Track already playing");
            return false;
        }

        self.release_locked(state).await;

        match self.acquire(&track, radio).await {
            Ok(loaded) => {
                state.handle = Some(loaded);
                if let Some(playlist) = playlist.filter(|p| !p.is_empty()) {
                    if !radio {
                        state.active_playlist = playlist;
                    }
                }
                state.current_track = Some(track.clone());
                state.is_playing = true;
                state.is_radio = radio;
                state.remember(track.clone());

                self.snapshots.save_started(&track, radio).await;
                info!(uri = %display_uri(&track.uri), radio, "Playback started");
                self.emit(PlaybackEvent::Started {
                    uri: track.uri.clone(),
                    title: track.title.clone(),
                    radio,
                });
                self.publish(state);
                true
            }
            Err(err) => {
                warn!(uri = %display_uri(&track.uri), error = %err, "Failed to start playback");
                // The old stream is gone, so a restart must not auto-play it.
                self.snapshots.save_playing(false).await;
                self.emit_error(Some(track.uri.clone()), &err);
                self.publish(state);
                false
            }
        }
    }

    async fn pause(&self) {
        let mut state = self.state.lock().await;
        let Some(handle) = state.handle.as_ref().map(|l| Arc::clone(&l.handle)) else {
            debug!("Pause ignored, nothing loaded");
            return;
        };
        if !state.is_playing {
            return;
        }

        match handle.pause().await {
            Ok(()) => {
                state.is_playing = false;
                self.snapshots.save_playing(false).await;
                if let Some(uri) = state.current_uri() {
                    self.emit(PlaybackEvent::Paused { uri });
                }
                self.publish(&state);
            }
            Err(err) => {
                warn!(error = %err, "Failed to pause");
                self.emit_error(state.current_uri(), &PlaybackError::from(err));
            }
        }
    }

    async fn resume(self: &Arc<Self>, reacquire: bool) {
        let mut state = self.state.lock().await;
        if state.is_playing {
            return;
        }

        let Some(handle) = state.handle.as_ref().map(|l| Arc::clone(&l.handle)) else {
            match state.current_track.clone() {
                Some(track) if reacquire => {
                    let radio = state.is_radio;
                    self.play_locked(&mut state, track, None, radio).await;
                }
                Some(_) => debug!("Resume ignored, nothing loaded"),
                None => {
                    debug!("Resume ignored, no current track");
                    self.emit_error(None, &PlaybackError::NoTrackLoaded);
                }
            }
            return;
        };

        match handle.play().await {
            Ok(()) => {
                state.is_playing = true;
                self.snapshots.save_playing(true).await;
                if let Some(uri) = state.current_uri() {
                    self.emit(PlaybackEvent::Resumed { uri });
                }
                self.publish(&state);
            }
            Err(err) => {
                warn!(error = %err, "Failed to resume");
                self.emit_error(state.current_uri(), &PlaybackError::from(err));
            }
        }
    }

    async fn play_next(self: &Arc<Self>) {
        let mut state = self.state.lock().await;
        if state.is_radio {
            self.advance_radio_locked(&mut state).await;
            return;
        }

        let next = state
            .playlist_position()
            .and_then(|index| state.active_playlist.get(index + 1))
            .cloned();
        match next {
            Some(track) => {
                self.play_locked(&mut state, track, None, false).await;
            }
            None => debug!("No next track"),
        }
    }

    async fn play_previous(self: &Arc<Self>) {
        let mut state = self.state.lock().await;
        if state.is_radio {
            debug!("Previous is disabled in radio mode");
            return;
        }

        let previous = state
            .playlist_position()
            .filter(|index| *index > 0)
            .and_then(|index| state.active_playlist.get(index - 1))
            .cloned();
        match previous {
            Some(track) => {
                self.play_locked(&mut state, track, None, false).await;
            }
            None => debug!("No previous track"),
        }
    }

    /// Start a random device track in radio mode.
    async fn advance_radio_locked(self: &Arc<Self>, state: &mut SessionState) -> bool {
        let tracks = self.catalog.tracks().await;
        match pick_track(self.picker.as_ref(), &tracks) {
            Some(track) => self.play_locked(state, track, None, true).await,
            None => {
                warn!("Radio has no tracks to pick from");
                self.release_locked(state).await;
                state.is_radio = false;
                self.snapshots.save_playing(false).await;
                self.snapshots.save_radio(false).await;
                self.emit_error(None, &PlaybackError::EmptyLibrary);
                self.publish(state);
                false
            }
        }
    }

    async fn start_radio(self: &Arc<Self>) -> bool {
        let mut state = self.state.lock().await;
        self.release_locked(&mut state).await;
        let started = self.advance_radio_locked(&mut state).await;
        if started {
            self.emit(PlaybackEvent::RadioStarted);
        }
        started
    }

    async fn stop_radio(&self) {
        let mut state = self.state.lock().await;
        let was_radio = state.is_radio;
        let uri = state.current_uri();

        self.release_locked(&mut state).await;
        state.current_track = None;
        state.is_radio = false;
        self.snapshots.save_playing(false).await;
        self.snapshots.save_radio(false).await;

        info!("Playback stopped");
        self.emit(PlaybackEvent::Stopped { uri });
        if was_radio {
            self.emit(PlaybackEvent::RadioStopped);
        }
        self.publish(&state);
    }

    async fn restore(self: &Arc<Self>) {
        let snapshot = self.snapshots.load().await;
        let mut state = self.state.lock().await;

        if snapshot.was_playing && snapshot.was_radio {
            if let Some(track) = snapshot.last_song {
                state.current_track = Some(track);
            }
            info!("Restoring radio session");
            if self.advance_radio_locked(&mut state).await {
                self.emit(PlaybackEvent::RadioStarted);
            }
            return;
        }

        let Some(track) = snapshot.last_song else {
            debug!("Nothing to restore");
            return;
        };

        info!(uri = %display_uri(&track.uri), was_playing = snapshot.was_playing, "Restoring session");
        if snapshot.was_playing {
            self.play_locked(&mut state, track, None, false).await;
        } else {
            state.current_track = Some(track);
            state.is_radio = false;
            self.publish(&state);
        }
    }

    async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if state.handle.is_none() {
            return;
        }
        self.release_locked(&mut state).await;
        info!("Playback session released");
        self.emit(PlaybackEvent::Stopped {
            uri: state.current_uri(),
        });
        self.publish(&state);
    }

    /// Status from the watcher of handle `id`.
    fn on_status(self: &Arc<Self>, id: PlaybackHandleId, status: PlaybackStatus) {
        let mut uri = None;
        self.now_playing.send_if_modified(|np| {
            if np.handle_id != Some(id) || np.progress == status {
                return false;
            }
            np.progress = status;
            uri = np.track.as_ref().map(|t| t.uri.clone());
            true
        });

        if let Some(uri) = uri {
            self.emit(PlaybackEvent::PositionChanged {
                uri,
                position_ms: status.position_ms,
                duration_ms: status.duration_ms,
            });
        }

        if status.finished {
            let inner = Arc::clone(self);
            tokio::spawn(async move { inner.on_track_finished(id).await });
        }
    }

    async fn on_track_finished(self: Arc<Self>, id: PlaybackHandleId) {
        let mut state = self.state.lock().await;
        if state.handle_id() != Some(id) {
            trace!("Ignoring finish from a replaced handle");
            return;
        }

        if state.is_radio {
            debug!("Radio track finished, picking the next one");
            self.advance_radio_locked(&mut state).await;
            return;
        }

        state.is_playing = false;
        self.snapshots.save_playing(false).await;
        if let Some(uri) = state.current_uri() {
            debug!(uri = %display_uri(&uri), "Track finished");
            self.emit(PlaybackEvent::Completed { uri });
        }
        self.publish(&state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(uri: &str) -> Track {
        Track::new(format!("{}.mp3", uri), uri, 60.0)
    }

    fn state_with(playlist: &[&str], current: Option<&str>) -> SessionState {
        SessionState {
            active_playlist: playlist.iter().map(|u| track(u)).collect(),
            current_track: current.map(track),
            ..Default::default()
        }
    }

    #[test]
    fn test_neighbours_inside_playlist() {
        assert_eq!(state_with(&["a", "b", "c"], Some("a")).neighbours(), (false, true));
        assert_eq!(state_with(&["a", "b", "c"], Some("b")).neighbours(), (true, true));
        assert_eq!(state_with(&["a", "b", "c"], Some("c")).neighbours(), (true, false));
    }

    #[test]
    fn test_neighbours_outside_playlist() {
        assert_eq!(state_with(&["a", "b"], Some("z")).neighbours(), (false, false));
        assert_eq!(state_with(&[], None).neighbours(), (false, false));
    }

    #[test]
    fn test_radio_enables_only_next() {
        let mut state = state_with(&["a", "b"], Some("a"));
        state.is_radio = true;
        assert_eq!(state.neighbours(), (false, true));
    }

    #[test]
    fn test_history_is_bounded_and_skips_repeats() {
        let mut state = SessionState::default();
        state.remember(track("a"));
        state.remember(track("a"));
        assert_eq!(state.history.len(), 1);

        for i in 0..(HISTORY_LIMIT + 10) {
            state.remember(track(&format!("u{}", i)));
        }
        assert_eq!(state.history.len(), HISTORY_LIMIT);
        assert_eq!(
            state.history.front().map(|t| t.uri.as_str()),
            Some(format!("u{}", HISTORY_LIMIT + 9).as_str())
        );
    }
}
