//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `KeyValueStore` using a SQLite-backed table
//! - `MediaLibrary` scanning a music directory, with durations read by `lofty`
//! - `LifecycleObserver` as no-op (desktop always foreground)
//!
//! There is no desktop `PlaybackHandleFactory`: the host application wires its
//! own audio engine in.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DirectoryMediaLibrary, SqliteKeyValueStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SqliteKeyValueStore::new("/tmp/mixtape/store.db".into()).await.unwrap();
//!     let library = DirectoryMediaLibrary::user_music_dir().unwrap();
//!
//!     // Use in core configuration
//! }
//! ```

mod kv_store;
mod lifecycle;
mod media;

pub use kv_store::SqliteKeyValueStore;
pub use lifecycle::DesktopLifecycleObserver;
pub use media::{DirectoryMediaLibrary, DEFAULT_AUDIO_EXTENSIONS};
