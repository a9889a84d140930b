//! Media enumeration bridge.
//!
//! Hosts expose the audio files indexed on the device (MediaStore on Android,
//! the media library on iOS, a music folder on desktop).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Outcome of a runtime media-permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// One audio file as reported by the platform media index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsset {
    /// File name including extension (used as the display title).
    pub filename: String,
    /// Platform URI the playback engine can open.
    pub uri: String,
    /// Duration in seconds; `0.0` when the index does not know it.
    pub duration_secs: f64,
}

impl AudioAsset {
    pub fn new(filename: impl Into<String>, uri: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            filename: filename.into(),
            uri: uri.into(),
            duration_secs,
        }
    }
}

/// Platform media enumerator.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::media::MediaLibrary;
///
/// async fn count(library: &dyn MediaLibrary) -> Result<usize> {
///     if !library.request_permission().await?.is_granted() {
///         return Ok(0);
///     }
///     Ok(library.list_audio_assets(1000).await?.len())
/// }
/// ```
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Ask the user (or the OS) for read access to audio media.
    ///
    /// Implementations should return `Denied` rather than an error when the
    /// user refuses.
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// List up to `limit` audio assets.
    async fn list_audio_assets(&self, limit: usize) -> Result<Vec<AudioAsset>>;
}
