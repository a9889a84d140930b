//! Last-played session snapshot.
//!
//! Three keys survive a restart: the last track started, whether audio was
//! playing and whether radio mode was on. Position is not persisted.
//! Reads never fail and writes never propagate: a broken store degrades to
//! "nothing to restore" and a warning in the logs.

use bridge_traits::storage::KeyValueStore;
use core_library::codec::{self, LAST_SONG_KEY, WAS_PLAYING_KEY, WAS_RADIO_KEY};
use core_library::Track;
use std::sync::Arc;
use tracing::warn;

/// Persisted playback intent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub last_song: Option<Track>,
    pub was_playing: bool,
    pub was_radio: bool,
}

/// Reads and writes [`SessionSnapshot`] fields in the key-value store.
#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<dyn KeyValueStore>,
}

impl SnapshotStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get_string(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "Failed to read session snapshot");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str) {
        if let Err(err) = self.store.set_string(key, value).await {
            warn!(key, error = %err, "Failed to persist session snapshot");
        }
    }

    pub async fn load(&self) -> SessionSnapshot {
        let last_song = self.read(LAST_SONG_KEY).await;
        let was_playing = self.read(WAS_PLAYING_KEY).await;
        let was_radio = self.read(WAS_RADIO_KEY).await;

        SessionSnapshot {
            last_song: codec::decode_track(last_song.as_deref()),
            was_playing: codec::decode_flag(was_playing.as_deref()),
            was_radio: codec::decode_flag(was_radio.as_deref()),
        }
    }

    /// Record a freshly started track.
    pub async fn save_started(&self, track: &Track, radio: bool) {
        match codec::encode_track(track) {
            Ok(json) => self.write(LAST_SONG_KEY, &json).await,
            Err(err) => warn!(error = %err, "Failed to encode last song"),
        }
        self.write(WAS_PLAYING_KEY, codec::encode_flag(true)).await;
        self.write(WAS_RADIO_KEY, codec::encode_flag(radio)).await;
    }

    pub async fn save_playing(&self, playing: bool) {
        self.write(WAS_PLAYING_KEY, codec::encode_flag(playing)).await;
    }

    pub async fn save_radio(&self, radio: bool) {
        self.write(WAS_RADIO_KEY, codec::encode_flag(radio)).await;
    }
}
