//! Observable now-playing state.

use bridge_traits::playback::{PlaybackHandleId, PlaybackStatus};
use core_library::Track;
use serde::Serialize;

/// What the session is doing right now.
///
/// Published through a `tokio::sync::watch` channel; every transport change
/// and every progress tick produces a new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NowPlaying {
    /// Track currently loaded (or last loaded when stopped by the host).
    pub track: Option<Track>,
    pub is_playing: bool,
    pub is_radio: bool,
    /// Previous is enabled only inside an active playlist.
    pub has_previous: bool,
    /// Next is enabled inside an active playlist and always in radio mode.
    pub has_next: bool,
    /// Latest progress of the live handle. Reset on every acquire.
    #[serde(skip)]
    pub progress: PlaybackStatus,
    /// Live handle the progress belongs to.
    #[serde(skip)]
    pub handle_id: Option<PlaybackHandleId>,
}

impl NowPlaying {
    /// Progress in `0.0..=1.0`.
    pub fn progress_fraction(&self) -> f32 {
        self.progress.fraction()
    }

    pub fn is_loaded(&self) -> bool {
        self.handle_id.is_some()
    }
}
