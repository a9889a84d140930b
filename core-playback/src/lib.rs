//! # Playback Session Module
//!
//! Owns the single live audio stream of the player.
//!
//! ## Overview
//!
//! This module handles:
//! - Acquiring and releasing host playback handles, never more than one at a time
//! - Playlist navigation and radio mode (random successor, looping stream)
//! - Progress observation through pushed status or polling
//! - Persisting and restoring the last-played snapshot

pub mod error;
pub mod radio;
pub mod session;
pub mod snapshot;
pub mod state;
mod watcher;

pub use error::{PlaybackError, Result};
pub use radio::{RandomPicker, TrackPicker};
pub use session::{AudioSession, AudioSessionBuilder, PlayOptions, HISTORY_LIMIT};
pub use snapshot::{SessionSnapshot, SnapshotStore};
pub use state::NowPlaying;
