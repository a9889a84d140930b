//! # Core Configuration Module
//!
//! Provides configuration management for the player core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all necessary bridges and settings for the core.
//! It enforces fail-fast validation so a host learns about a missing
//! capability at startup rather than on the first button press.
//!
//! ## Required Dependencies
//!
//! - `KeyValueStore` - Favorites, playlists and the session snapshot
//! - `MediaLibrary` - Device audio enumeration
//! - `PlaybackHandleFactory` - The host audio engine
//! - `ConfirmationPrompt` - User confirmation before destructive actions
//!
//! ## Optional Dependencies
//!
//! - `LifecycleObserver` - App lifecycle (suspension releases the audio handle)
//!
//! When the `desktop-shims` feature is enabled, `SqliteKeyValueStore` and
//! `DirectoryMediaLibrary` defaults are injected if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .key_value_store(Arc::new(MyStore))
//!     .media_library(Arc::new(MyMediaLibrary))
//!     .playback_factory(Arc::new(MyAudioEngine))
//!     .confirmation_prompt(Arc::new(MyDialogs))
//!     .status_poll_interval(Duration::from_millis(250))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{
    ConfirmationPrompt, KeyValueStore, LifecycleObserver, MediaLibrary, PlaybackHandleFactory,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default interval between `status()` polls when a handle has no push stream.
pub const DEFAULT_STATUS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default cap on the number of assets requested from the media library.
pub const DEFAULT_MEDIA_SCAN_LIMIT: usize = 1000;

const MIN_STATUS_POLL_INTERVAL: Duration = Duration::from_millis(100);
const MAX_STATUS_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Core configuration for the player.
///
/// This struct holds all bridges and settings required to start the core.
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Persistent key-value store (required)
    pub key_value_store: Arc<dyn KeyValueStore>,

    /// Device media enumerator (required)
    pub media_library: Arc<dyn MediaLibrary>,

    /// Host audio engine (required)
    pub playback_factory: Arc<dyn PlaybackHandleFactory>,

    /// User confirmation dialogs (required)
    pub confirmation_prompt: Arc<dyn ConfirmationPrompt>,

    /// App lifecycle observer (optional)
    pub lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,

    /// Session tuning
    pub session: SessionSettings,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("key_value_store", &"KeyValueStore { ... }")
            .field("media_library", &"MediaLibrary { ... }")
            .field("playback_factory", &"PlaybackHandleFactory { ... }")
            .field("confirmation_prompt", &"ConfirmationPrompt { ... }")
            .field(
                "lifecycle_observer",
                &self
                    .lifecycle_observer
                    .as_ref()
                    .map(|_| "LifecycleObserver { ... }"),
            )
            .field("session", &self.session)
            .finish()
    }
}

/// Tunables for the audio session and media catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Interval between `status()` polls for handles without a push stream.
    ///
    /// Default: 500ms. Must be within 100ms..=5000ms.
    pub status_poll_interval: Duration,

    /// Maximum number of assets requested from the media library.
    ///
    /// Default: 1000
    pub media_scan_limit: usize,

    /// Restore the last session snapshot during bootstrap.
    ///
    /// Default: true
    pub restore_on_start: bool,

    /// Per-subscriber buffer of the event bus.
    pub event_buffer_size: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            status_poll_interval: DEFAULT_STATUS_POLL_INTERVAL,
            media_scan_limit: DEFAULT_MEDIA_SCAN_LIMIT,
            restore_on_start: true,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl SessionSettings {
    /// Validates the settings.
    pub fn validate(&self) -> Result<()> {
        if self.status_poll_interval < MIN_STATUS_POLL_INTERVAL {
            return Err(Error::Config(format!(
                "Status poll interval must be at least {}ms",
                MIN_STATUS_POLL_INTERVAL.as_millis()
            )));
        }

        if self.status_poll_interval > MAX_STATUS_POLL_INTERVAL {
            return Err(Error::Config(format!(
                "Status poll interval exceeds maximum of {}ms",
                MAX_STATUS_POLL_INTERVAL.as_millis()
            )));
        }

        if self.media_scan_limit == 0 {
            return Err(Error::Config(
                "Media scan limit must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.session.validate()
    }
}

fn capability_missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn key_value_store_missing_error() -> Error {
    capability_missing(
        "KeyValueStore",
        "KeyValueStore implementation is required for favorites, playlists and session restore. \
         Desktop: enable the 'desktop-shims' feature to use the default SqliteKeyValueStore. \
         Mobile: inject platform-native storage (UserDefaults/SharedPreferences).",
    )
}

#[cfg(not(feature = "desktop-shims"))]
fn media_library_missing_error() -> Error {
    capability_missing(
        "MediaLibrary",
        "MediaLibrary implementation is required to list device audio. \
         Desktop: enable the 'desktop-shims' feature to scan the user's music directory. \
         Mobile: inject the platform media store (MediaPlayer/MediaStore).",
    )
}

#[cfg(feature = "desktop-shims")]
fn provide_default_key_value_store(
    database_path: Option<PathBuf>,
) -> Result<Arc<dyn KeyValueStore>> {
    use bridge_desktop::SqliteKeyValueStore;
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let path = database_path.ok_or_else(|| {
        Error::Config(
            "Database path is required for the default key-value store. \
             Use .database_path() to set it or inject a KeyValueStore."
                .to_string(),
        )
    })?;

    let init_store = |path: PathBuf| -> Result<SqliteKeyValueStore> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to create Tokio runtime for default key-value store: {}",
                    e
                ))
            })?;

        runtime
            .block_on(SqliteKeyValueStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default KeyValueStore: {}", e))
            })
    };

    // block_on panics inside a runtime, so open the pool from a plain thread there.
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default KeyValueStore".to_string(),
                )
            })??,
        Err(_) => init_store(path)?,
    };

    let store: Arc<dyn KeyValueStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_key_value_store(
    _database_path: Option<PathBuf>,
) -> Result<Arc<dyn KeyValueStore>> {
    Err(key_value_store_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_media_library(music_dir: Option<PathBuf>) -> Result<Arc<dyn MediaLibrary>> {
    use bridge_desktop::DirectoryMediaLibrary;

    let library = match music_dir {
        Some(dir) => DirectoryMediaLibrary::new(dir),
        None => DirectoryMediaLibrary::user_music_dir().map_err(|e| {
            capability_missing(
                "MediaLibrary",
                &format!("Could not locate a music directory: {}", e),
            )
        })?,
    };

    let library: Arc<dyn MediaLibrary> = Arc::new(library);
    Ok(library)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_media_library(_music_dir: Option<PathBuf>) -> Result<Arc<dyn MediaLibrary>> {
    Err(media_library_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) to validate and create the
/// final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    music_dir: Option<PathBuf>,
    key_value_store: Option<Arc<dyn KeyValueStore>>,
    media_library: Option<Arc<dyn MediaLibrary>>,
    playback_factory: Option<Arc<dyn PlaybackHandleFactory>>,
    confirmation_prompt: Option<Arc<dyn ConfirmationPrompt>>,
    lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,
    session: SessionSettings,
}

impl CoreConfigBuilder {
    /// Sets the SQLite file used by the default desktop key-value store.
    ///
    /// Ignored when a store is injected with
    /// [`key_value_store`](Self::key_value_store).
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the directory scanned by the default desktop media library.
    ///
    /// Defaults to the user's music directory.
    pub fn music_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.music_dir = Some(path.into());
        self
    }

    /// Sets the key-value store implementation (required).
    pub fn key_value_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.key_value_store = Some(store);
        self
    }

    /// Sets the media library implementation (required).
    pub fn media_library(mut self, library: Arc<dyn MediaLibrary>) -> Self {
        self.media_library = Some(library);
        self
    }

    /// Sets the playback handle factory (required).
    ///
    /// There is no default: the core never decodes audio itself.
    pub fn playback_factory(mut self, factory: Arc<dyn PlaybackHandleFactory>) -> Self {
        self.playback_factory = Some(factory);
        self
    }

    /// Sets the confirmation prompt implementation (required).
    pub fn confirmation_prompt(mut self, prompt: Arc<dyn ConfirmationPrompt>) -> Self {
        self.confirmation_prompt = Some(prompt);
        self
    }

    /// Sets the lifecycle observer implementation (optional).
    ///
    /// When the host reports `Suspended`, the audio handle is released.
    pub fn lifecycle_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.lifecycle_observer = Some(observer);
        self
    }

    /// Sets the status poll interval.
    ///
    /// Default: 500ms
    pub fn status_poll_interval(mut self, interval: Duration) -> Self {
        self.session.status_poll_interval = interval;
        self
    }

    /// Sets the media scan limit.
    ///
    /// Default: 1000
    pub fn media_scan_limit(mut self, limit: usize) -> Self {
        self.session.media_scan_limit = limit;
        self
    }

    /// Enables or disables session restore at bootstrap.
    ///
    /// Default: true
    pub fn restore_on_start(mut self, enabled: bool) -> Self {
        self.session.restore_on_start = enabled;
        self
    }

    /// Sets the event bus buffer size.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.session.event_buffer_size = size;
        self
    }

    /// Sets all session settings at once.
    pub fn session_settings(mut self, settings: SessionSettings) -> Self {
        self.session = settings;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - Required bridges are missing and no desktop default applies
    /// - Session settings are out of range
    pub fn build(self) -> Result<CoreConfig> {
        let playback_factory = self.playback_factory.ok_or_else(|| {
            capability_missing(
                "PlaybackHandleFactory",
                "PlaybackHandleFactory implementation is required: the core has no audio engine. \
                 Inject the host's player (AVAudioPlayer/ExoPlayer/rodio wrapper).",
            )
        })?;

        let confirmation_prompt = self.confirmation_prompt.ok_or_else(|| {
            capability_missing(
                "ConfirmationPrompt",
                "ConfirmationPrompt implementation is required before playlists can be deleted. \
                 Inject a dialog presenter, or an always-confirm prompt for headless hosts.",
            )
        })?;

        let key_value_store = match self.key_value_store {
            Some(store) => store,
            None => provide_default_key_value_store(self.database_path)?,
        };

        let media_library = match self.media_library {
            Some(library) => library,
            None => provide_default_media_library(self.music_dir)?,
        };

        let config = CoreConfig {
            key_value_store,
            media_library,
            playback_factory,
            confirmation_prompt,
            lifecycle_observer: self.lifecycle_observer,
            session: self.session,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{
        AcquireOptions, AudioAsset, BridgeError, ConfirmationRequest, MemoryKeyValueStore,
        PermissionStatus, PlaybackHandle,
    };

    struct MockMediaLibrary;

    #[async_trait]
    impl MediaLibrary for MockMediaLibrary {
        async fn request_permission(&self) -> std::result::Result<PermissionStatus, BridgeError> {
            Ok(PermissionStatus::Granted)
        }

        async fn list_audio_assets(
            &self,
            _limit: usize,
        ) -> std::result::Result<Vec<AudioAsset>, BridgeError> {
            Ok(Vec::new())
        }
    }

    struct MockPlaybackFactory;

    #[async_trait]
    impl PlaybackHandleFactory for MockPlaybackFactory {
        async fn acquire(
            &self,
            _uri: &str,
            _options: AcquireOptions,
        ) -> std::result::Result<Box<dyn PlaybackHandle>, BridgeError> {
            Err(BridgeError::NotAvailable("no audio in tests".to_string()))
        }
    }

    struct AlwaysConfirm;

    #[async_trait]
    impl ConfirmationPrompt for AlwaysConfirm {
        async fn confirm(&self, _request: &ConfirmationRequest) -> bool {
            true
        }
    }

    fn complete_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .key_value_store(Arc::new(MemoryKeyValueStore::new()))
            .media_library(Arc::new(MockMediaLibrary))
            .playback_factory(Arc::new(MockPlaybackFactory))
            .confirmation_prompt(Arc::new(AlwaysConfirm))
    }

    #[test]
    fn test_builder_with_all_required_fields() {
        let config = complete_builder().build().unwrap();
        assert_eq!(config.session, SessionSettings::default());
        assert!(config.lifecycle_observer.is_none());
    }

    #[test]
    fn test_builder_requires_playback_factory() {
        let result = CoreConfig::builder()
            .key_value_store(Arc::new(MemoryKeyValueStore::new()))
            .media_library(Arc::new(MockMediaLibrary))
            .confirmation_prompt(Arc::new(AlwaysConfirm))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "PlaybackHandleFactory")
            }
            other => panic!("expected missing capability, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_requires_confirmation_prompt() {
        let result = CoreConfig::builder()
            .key_value_store(Arc::new(MemoryKeyValueStore::new()))
            .media_library(Arc::new(MockMediaLibrary))
            .playback_factory(Arc::new(MockPlaybackFactory))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "ConfirmationPrompt"
        ));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_key_value_store() {
        let result = CoreConfig::builder()
            .media_library(Arc::new(MockMediaLibrary))
            .playback_factory(Arc::new(MockPlaybackFactory))
            .confirmation_prompt(Arc::new(AlwaysConfirm))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "KeyValueStore"
        ));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_media_library() {
        let result = CoreConfig::builder()
            .key_value_store(Arc::new(MemoryKeyValueStore::new()))
            .playback_factory(Arc::new(MockPlaybackFactory))
            .confirmation_prompt(Arc::new(AlwaysConfirm))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "MediaLibrary"
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_store_requires_database_path() {
        let result = CoreConfig::builder()
            .media_library(Arc::new(MockMediaLibrary))
            .playback_factory(Arc::new(MockPlaybackFactory))
            .confirmation_prompt(Arc::new(AlwaysConfirm))
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let base = std::env::temp_dir().join(format!("core-runtime-test-{}", uuid::Uuid::new_v4()));

        let config = CoreConfig::builder()
            .database_path(base.join("player.db"))
            .music_dir(base.join("Music"))
            .playback_factory(Arc::new(MockPlaybackFactory))
            .confirmation_prompt(Arc::new(AlwaysConfirm))
            .build()
            .expect("desktop defaults should succeed");

        let store = config.key_value_store.clone();
        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        runtime.block_on(async {
            store.set_string("wasRadio", "false").await.unwrap();
            let value = store.get_string("wasRadio").await.unwrap();
            assert_eq!(value.as_deref(), Some("false"));
        });

        drop(config);
        let _ = std::fs::remove_dir_all(&base);
    }

    #[cfg(feature = "desktop-shims")]
    #[tokio::test]
    async fn test_build_with_desktop_defaults_inside_runtime() {
        let base = std::env::temp_dir().join(format!("core-runtime-test-{}", uuid::Uuid::new_v4()));

        let config = CoreConfig::builder()
            .database_path(base.join("player.db"))
            .music_dir(base.join("Music"))
            .playback_factory(Arc::new(MockPlaybackFactory))
            .confirmation_prompt(Arc::new(AlwaysConfirm))
            .build()
            .expect("desktop defaults should succeed inside runtime");

        config
            .key_value_store
            .set_string("favorites", "[]")
            .await
            .expect("write inside runtime");
        assert!(config.key_value_store.has_key("favorites").await.unwrap());

        drop(config);
        let _ = tokio::fs::remove_dir_all(&base).await;
    }

    #[test]
    fn test_builder_with_custom_settings() {
        let config = complete_builder()
            .status_poll_interval(Duration::from_millis(250))
            .media_scan_limit(50)
            .restore_on_start(false)
            .event_buffer_size(16)
            .build()
            .unwrap();

        assert_eq!(config.session.status_poll_interval, Duration::from_millis(250));
        assert_eq!(config.session.media_scan_limit, 50);
        assert!(!config.session.restore_on_start);
        assert_eq!(config.session.event_buffer_size, 16);
    }

    #[test]
    fn test_validate_rejects_fast_polling() {
        let result = complete_builder()
            .status_poll_interval(Duration::from_millis(10))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_slow_polling() {
        let result = complete_builder()
            .status_poll_interval(Duration::from_secs(10))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_scan_limit() {
        let result = complete_builder().media_scan_limit(0).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_event_buffer() {
        let settings = SessionSettings {
            event_buffer_size: 0,
            ..SessionSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_config_is_cloneable_and_debuggable() {
        let config = complete_builder().build().unwrap();
        let cloned = config.clone();
        assert_eq!(cloned.session, config.session);
        assert!(format!("{:?}", cloned).contains("KeyValueStore { ... }"));
    }
}
