//! Domain models for the music library

use bridge_traits::media::AudioAsset;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A playable audio item.
///
/// Identity is the `uri`: two tracks with the same URI are the same track
/// even if a stored copy carries a stale title or no duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Display title (the asset's file name)
    pub title: String,
    /// Opaque resource locator handed to the playback handle factory
    pub uri: String,
    /// Duration in seconds, `0` when unknown
    #[serde(default)]
    pub duration: f64,
}

impl Track {
    pub fn new(title: impl Into<String>, uri: impl Into<String>, duration: f64) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
            duration,
        }
    }

    /// Whether both values refer to the same audio resource.
    pub fn same_track(&self, other: &Track) -> bool {
        self.uri == other.uri
    }

    /// Validate a track decoded from storage.
    pub fn validate(&self) -> Result<(), String> {
        if self.uri.trim().is_empty() {
            return Err("Track uri cannot be empty".to_string());
        }

        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(format!("Track duration {} is not valid", self.duration));
        }

        Ok(())
    }

    /// Normalize a string for searching (lowercase, trimmed)
    pub fn normalize(s: &str) -> String {
        s.trim().to_lowercase()
    }

    /// `m:ss` rendering of the duration.
    pub fn formatted_duration(&self) -> String {
        format_duration(self.duration)
    }
}

impl From<AudioAsset> for Track {
    fn from(asset: AudioAsset) -> Self {
        let duration = if asset.duration_secs.is_finite() && asset.duration_secs > 0.0 {
            asset.duration_secs
        } else {
            0.0
        };

        Self {
            title: asset.filename,
            uri: asset.uri,
            duration,
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.formatted_duration())
    }
}

/// Render seconds as `m:ss`, flooring both parts.
///
/// Minutes are not wrapped into hours: a 75 minute recording renders as
/// `75:00`. Negative or non-finite input renders as `0:00`.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(5.9), "0:05");
        assert_eq!(format_duration(65.0), "1:05");
        assert_eq!(format_duration(599.99), "9:59");
        assert_eq!(format_duration(4500.0), "75:00");
        assert_eq!(format_duration(-3.0), "0:00");
        assert_eq!(format_duration(f64::NAN), "0:00");
    }

    #[test]
    fn test_track_from_asset() {
        let asset = AudioAsset::new("song.mp3", "file:///music/song.mp3", 183.4);
        let track = Track::from(asset);

        assert_eq!(track.title, "song.mp3");
        assert_eq!(track.uri, "file:///music/song.mp3");
        assert_eq!(track.duration, 183.4);
        assert_eq!(track.formatted_duration(), "3:03");
    }

    #[test]
    fn test_track_from_asset_without_duration() {
        let asset = AudioAsset::new("voice.m4a", "file:///voice.m4a", f64::NAN);
        assert_eq!(Track::from(asset).duration, 0.0);
    }

    #[test]
    fn test_identity_is_uri() {
        let a = Track::new("Old title", "u1", 10.0);
        let b = Track::new("New title", "u1", 0.0);
        let c = Track::new("Old title", "u2", 10.0);

        assert!(a.same_track(&b));
        assert!(!a.same_track(&c));
    }

    #[test]
    fn test_track_validation() {
        let mut track = Track::new("song", "u1", 10.0);
        assert!(track.validate().is_ok());

        track.uri = "  ".to_string();
        assert!(track.validate().is_err());

        track.uri = "u1".to_string();
        track.duration = -1.0;
        assert!(track.validate().is_err());
    }

    #[test]
    fn test_missing_duration_defaults_to_zero() {
        let track: Track = serde_json::from_str(r#"{"title":"a","uri":"u1"}"#).unwrap();
        assert_eq!(track.duration, 0.0);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(Track::normalize("  Night Drive  "), "night drive");
    }
}
