//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (key-value store,
//! media library, playback handles, confirmation dialogs, lifecycle) into the
//! shared Rust core. Desktop apps typically enable the `desktop-shims` feature
//! (which depends on `bridge-desktop`) for the store and media library, and
//! always supply their own playback handle factory.

pub mod error;
mod lifecycle;
pub mod mini_player;
pub mod service;

pub use error::{CoreError, Result};
pub use mini_player::{MiniPlayer, MiniPlayerView};
pub use service::{CoreService, TrackRow};

pub use core_library::Track;
pub use core_playback::{AudioSession, NowPlaying, PlayOptions};
pub use core_runtime::config::{CoreConfig, CoreConfigBuilder, SessionSettings};
pub use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, PlaybackEvent};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{DesktopLifecycleObserver, DirectoryMediaLibrary, SqliteKeyValueStore};
