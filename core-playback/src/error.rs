//! # Playback Error Types

use bridge_traits::error::BridgeError;
use core_library::error::LibraryError;
use thiserror::Error;

/// Errors that can occur during playback operations.
///
/// Transport operations on [`AudioSession`](crate::AudioSession) absorb these
/// (logging them and emitting `PlaybackEvent::Error`); they surface only from
/// the lower-level helpers.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Host audio subsystem failed.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Library lookup failed.
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    /// Radio mode needs at least one device track.
    #[error("No tracks available for radio")]
    EmptyLibrary,

    /// Attempted operation when no track is loaded.
    #[error("No track loaded")]
    NoTrackLoaded,
}

impl PlaybackError {
    /// Returns `true` if retrying the same operation may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            PlaybackError::Bridge(BridgeError::PermissionDenied(_)) => false,
            PlaybackError::Bridge(_) => true,
            PlaybackError::Library(_) => true,
            PlaybackError::EmptyLibrary | PlaybackError::NoTrackLoaded => false,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
