//! Storage keys and the JSON encoding of library blobs.
//!
//! Decoding never fails. A missing key, a blob that is not JSON or a value of
//! the wrong shape yields the default structure and a `warn!`. Inside arrays,
//! entries that do not decode to a valid [`Track`] are dropped one by one so a
//! single corrupt row does not wipe a whole playlist.

use crate::error::Result;
use crate::models::Track;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// Ordered list of favorite tracks.
pub const FAVORITES_KEY: &str = "favorites";
/// Object mapping playlist name to an ordered list of tracks.
pub const PLAYLISTS_KEY: &str = "playlists";
/// Track of the most recent `play`.
pub const LAST_SONG_KEY: &str = "lastSong";
/// `"true"` / `"false"`: whether audio was playing at the last transition.
pub const WAS_PLAYING_KEY: &str = "wasPlaying";
/// `"true"` / `"false"`: whether radio mode was active.
pub const WAS_RADIO_KEY: &str = "wasRadio";

/// Playlists keyed by name, listed in name order.
pub type PlaylistMap = BTreeMap<String, Vec<Track>>;

fn parse(key: &str, raw: Option<&str>) -> Option<Value> {
    let raw = raw?;
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "Stored value is not valid JSON, using default");
            None
        }
    }
}

fn decode_track_value(key: &str, value: Value) -> Option<Track> {
    let track = match serde_json::from_value::<Track>(value) {
        Ok(track) => track,
        Err(err) => {
            warn!(key, error = %err, "Dropping malformed track entry");
            return None;
        }
    };

    if let Err(reason) = track.validate() {
        warn!(key, reason = %reason, "Dropping invalid track entry");
        return None;
    }

    Some(track)
}

fn decode_track_array(key: &str, value: Value) -> Vec<Track> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| decode_track_value(key, item))
            .collect(),
        Value::Null => Vec::new(),
        other => {
            warn!(key, kind = json_kind(&other), "Expected an array of tracks, using empty list");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode the favorites blob, dropping duplicate URIs (first occurrence wins).
pub fn decode_favorites(raw: Option<&str>) -> Vec<Track> {
    let Some(value) = parse(FAVORITES_KEY, raw) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    decode_track_array(FAVORITES_KEY, value)
        .into_iter()
        .filter(|track| seen.insert(track.uri.clone()))
        .collect()
}

/// Decode the playlists blob.
///
/// A playlist whose value is not an array is kept with an empty track list.
pub fn decode_playlists(raw: Option<&str>) -> PlaylistMap {
    let Some(value) = parse(PLAYLISTS_KEY, raw) else {
        return PlaylistMap::new();
    };

    let Value::Object(entries) = value else {
        warn!(
            key = PLAYLISTS_KEY,
            kind = json_kind(&value),
            "Expected an object of playlists, using empty map"
        );
        return PlaylistMap::new();
    };

    entries
        .into_iter()
        .map(|(name, tracks)| {
            let tracks = decode_track_array(PLAYLISTS_KEY, tracks);
            (name, tracks)
        })
        .collect()
}

/// Decode the `lastSong` blob.
pub fn decode_track(raw: Option<&str>) -> Option<Track> {
    let value = parse(LAST_SONG_KEY, raw)?;
    if value.is_null() {
        return None;
    }
    decode_track_value(LAST_SONG_KEY, value)
}

/// Decode a stored flag. Only `"true"` (or a JSON `true`) counts as set.
pub fn decode_flag(raw: Option<&str>) -> bool {
    matches!(raw.map(str::trim), Some("true"))
}

pub fn encode_flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

pub fn encode_tracks(tracks: &[Track]) -> Result<String> {
    Ok(serde_json::to_string(tracks)?)
}

pub fn encode_track(track: &Track) -> Result<String> {
    Ok(serde_json::to_string(track)?)
}

pub fn encode_playlists(playlists: &PlaylistMap) -> Result<String> {
    Ok(serde_json::to_string(playlists)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values_use_defaults() {
        assert!(decode_favorites(None).is_empty());
        assert!(decode_playlists(None).is_empty());
        assert!(decode_track(None).is_none());
        assert!(!decode_flag(None));
    }

    #[test]
    fn test_malformed_json_uses_defaults() {
        assert!(decode_favorites(Some("{not json")).is_empty());
        assert!(decode_playlists(Some("{not json")).is_empty());
        assert!(decode_track(Some("{not json")).is_none());
        assert!(!decode_flag(Some("{not json")));
    }

    #[test]
    fn test_favorites_drop_duplicates_and_bad_entries() {
        let raw = r#"[
            {"title":"a","uri":"u1","duration":10},
            {"title":"a again","uri":"u1","duration":10},
            {"title":"no uri"},
            42,
            {"title":"b","uri":"u2"}
        ]"#;

        let favorites = decode_favorites(Some(raw));
        let uris: Vec<_> = favorites.iter().map(|t| t.uri.as_str()).collect();
        assert_eq!(uris, vec!["u1", "u2"]);
        assert_eq!(favorites[0].title, "a");
        assert_eq!(favorites[1].duration, 0.0);
    }

    #[test]
    fn test_favorites_wrong_shape() {
        assert!(decode_favorites(Some(r#"{"title":"a","uri":"u1"}"#)).is_empty());
    }

    #[test]
    fn test_playlists_self_heal_non_arrays() {
        let raw = r#"{"Gym":[{"title":"a","uri":"u1"}],"Broken":"oops","Empty":null}"#;
        let playlists = decode_playlists(Some(raw));

        assert_eq!(playlists.len(), 3);
        assert_eq!(playlists["Gym"].len(), 1);
        assert!(playlists["Broken"].is_empty());
        assert!(playlists["Empty"].is_empty());
    }

    #[test]
    fn test_playlists_wrong_shape() {
        assert!(decode_playlists(Some("[1,2,3]")).is_empty());
    }

    #[test]
    fn test_last_song() {
        let track = decode_track(Some(r#"{"title":"a","uri":"u1","duration":3.5}"#)).unwrap();
        assert_eq!(track, Track::new("a", "u1", 3.5));
        assert!(decode_track(Some("null")).is_none());
        assert!(decode_track(Some(r#"{"title":"a"}"#)).is_none());
    }

    #[test]
    fn test_flags() {
        assert!(decode_flag(Some("true")));
        assert!(!decode_flag(Some("false")));
        assert!(!decode_flag(Some("yes")));
        assert_eq!(encode_flag(true), "true");
        assert_eq!(encode_flag(false), "false");
    }

    #[test]
    fn test_playlists_encode_as_object() {
        let mut playlists = PlaylistMap::new();
        playlists.insert("Gym".to_string(), vec![Track::new("a", "u1", 1.0)]);

        let json = encode_playlists(&playlists).unwrap();
        assert_eq!(json, r#"{"Gym":[{"title":"a","uri":"u1","duration":1.0}]}"#);
    }
}
