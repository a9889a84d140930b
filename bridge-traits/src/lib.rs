//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the player core and the
//! platform-specific capabilities it orchestrates. The core never decodes audio,
//! never talks to a media database directly and never owns a storage engine;
//! each of those is reached through one of the traits below.
//!
//! ## Traits
//!
//! ### Storage
//! - [`KeyValueStore`](storage::KeyValueStore) - String-keyed persistence for
//!   favorites, playlists and the last-played session snapshot
//!
//! ### Media & Playback
//! - [`MediaLibrary`](media::MediaLibrary) - Enumerate audio assets on the device
//! - [`PlaybackHandleFactory`](playback::PlaybackHandleFactory) - Acquire a
//!   controllable handle for one audio stream
//! - [`PlaybackHandle`](playback::PlaybackHandle) - Transport control and status
//!   reporting for an acquired stream
//!
//! ### Platform Integration
//! - [`LifecycleObserver`](lifecycle::LifecycleObserver) - App foreground/background transitions
//! - [`ConfirmationPrompt`](prompt::ConfirmationPrompt) - Ask the user before destructive actions
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Store + media library |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! The playback handle factory is always supplied by the host: the core has no
//! audio engine of its own.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert native failures into it and keep the message
//! actionable (which URI, which key, which permission).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind an `Arc`.

pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod media;
pub mod playback;
pub mod prompt;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use lifecycle::{LifecycleChangeStream, LifecycleObserver, LifecycleState};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{AudioAsset, MediaLibrary, PermissionStatus};
pub use playback::{
    AcquireOptions, PlaybackHandle, PlaybackHandleFactory, PlaybackHandleId, PlaybackStatus,
    PlaybackStatusStream,
};
pub use prompt::{ConfirmationPrompt, ConfirmationRequest};
pub use storage::{KeyValueStore, MemoryKeyValueStore};
