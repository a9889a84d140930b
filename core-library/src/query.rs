//! Title search over track lists.
//!
//! Every list screen (explore, favorites, playlist detail) filters the same way:
//! a case-insensitive substring match on the title, where an empty query keeps
//! everything. The filtered list is what gets handed to the session as the
//! navigation context, so next/previous follow what the user sees.

use crate::models::Track;
use serde::{Deserialize, Serialize};

/// Filter options for track lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackFilter {
    /// Substring to look for in titles, case-insensitive
    pub search: Option<String>,
}

impl TrackFilter {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            search: Some(query.into()),
        }
    }

    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::to_lowercase)
            .filter(|needle| !needle.is_empty())
    }

    pub fn matches(&self, track: &Track) -> bool {
        match self.needle() {
            Some(needle) => track.title.to_lowercase().contains(&needle),
            None => true,
        }
    }

    /// Apply the filter, preserving order.
    pub fn apply(&self, tracks: &[Track]) -> Vec<Track> {
        let Some(needle) = self.needle() else {
            return tracks.to_vec();
        };

        tracks
            .iter()
            .filter(|track| track.title.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}

/// Shorthand for `TrackFilter::search(query).apply(tracks)`.
pub fn filter_by_title(tracks: &[Track], query: &str) -> Vec<Track> {
    TrackFilter::search(query).apply(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks() -> Vec<Track> {
        vec![
            Track::new("Morning Run.mp3", "u1", 120.0),
            Track::new("night drive.flac", "u2", 240.0),
            Track::new("RUNAWAY.m4a", "u3", 200.0),
        ]
    }

    #[test]
    fn test_empty_query_keeps_all() {
        assert_eq!(filter_by_title(&tracks(), "").len(), 3);
        assert_eq!(TrackFilter::default().apply(&tracks()).len(), 3);
    }

    #[test]
    fn test_case_insensitive_substring() {
        let found = filter_by_title(&tracks(), "run");
        let uris: Vec<_> = found.iter().map(|t| t.uri.as_str()).collect();
        assert_eq!(uris, vec!["u1", "u3"]);
    }

    #[test]
    fn test_no_match() {
        assert!(filter_by_title(&tracks(), "jazz").is_empty());
    }

    #[test]
    fn test_matches_single_track() {
        let filter = TrackFilter::search("DRIVE");
        assert!(filter.matches(&tracks()[1]));
        assert!(!filter.matches(&tracks()[0]));
    }
}
