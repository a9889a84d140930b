//! Mini-player view model.
//!
//! Shown on every screen while a track is current. Reads the session through
//! its `watch` channel and forwards the three transport buttons.

use core_library::format_duration;
use core_playback::{AudioSession, NowPlaying};
use serde::Serialize;
use tokio::sync::watch;

/// What the mini-player renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiniPlayerView {
    pub title: String,
    pub uri: String,
    /// Show the pause icon when `true`, the play icon otherwise.
    pub is_playing: bool,
    pub is_radio: bool,
    /// `0.0..=1.0`, `0.0` while the duration is unknown.
    pub progress: f32,
    /// Elapsed time as `m:ss`.
    pub elapsed: String,
    pub can_previous: bool,
    pub can_next: bool,
}

impl MiniPlayerView {
    /// `None` when nothing is current.
    pub fn from_now_playing(now_playing: &NowPlaying) -> Option<Self> {
        let track = now_playing.track.as_ref()?;
        Some(Self {
            title: track.title.clone(),
            uri: track.uri.clone(),
            is_playing: now_playing.is_playing,
            is_radio: now_playing.is_radio,
            progress: now_playing.progress_fraction(),
            elapsed: format_duration(now_playing.progress.position().as_secs_f64()),
            can_previous: now_playing.has_previous,
            can_next: now_playing.has_next,
        })
    }
}

pub struct MiniPlayer {
    session: AudioSession,
    state: watch::Receiver<NowPlaying>,
}

impl MiniPlayer {
    pub fn new(session: AudioSession) -> Self {
        let state = session.subscribe();
        Self { session, state }
    }

    pub fn view(&self) -> Option<MiniPlayerView> {
        MiniPlayerView::from_now_playing(&self.state.borrow())
    }

    /// Wait for the next state change and return the new view.
    pub async fn changed(&mut self) -> Option<MiniPlayerView> {
        // The sender lives in `self.session`, so this never reports closed.
        let _ = self.state.changed().await;
        MiniPlayerView::from_now_playing(&self.state.borrow_and_update())
    }

    /// Middle button.
    pub async fn toggle(&self) {
        self.session.toggle_play_pause().await;
    }

    pub async fn next(&self) {
        self.session.play_next().await;
    }

    pub async fn previous(&self) {
        self.session.play_previous().await;
    }
}
