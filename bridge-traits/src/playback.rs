//! Playback bridge traits and supporting types.
//!
//! The core does not decode or render audio. It asks the host for a
//! [`PlaybackHandle`] per track and drives it through play/pause/stop/release,
//! observing progress through a status stream (or by polling when the host has
//! no push notifications).

use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::error::Result;

/// Options supplied when acquiring a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AcquireOptions {
    /// Start playing as soon as the stream is loaded.
    pub autoplay: bool,
    /// Restart from the beginning when the stream reaches its end.
    ///
    /// Hosts must still report `finished` on every pass so the core can react.
    pub looping: bool,
}

impl AcquireOptions {
    pub fn new(autoplay: bool, looping: bool) -> Self {
        Self { autoplay, looping }
    }
}

/// Snapshot of a handle's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackStatus {
    /// Current position (milliseconds).
    pub position_ms: u64,
    /// Stream duration (milliseconds); `0` when unknown.
    pub duration_ms: u64,
    /// The stream just reached its end.
    pub finished: bool,
}

impl PlaybackStatus {
    pub fn new(position_ms: u64, duration_ms: u64) -> Self {
        Self {
            position_ms,
            duration_ms,
            finished: false,
        }
    }

    /// Status reported at end-of-media.
    pub fn finished(duration_ms: u64) -> Self {
        Self {
            position_ms: duration_ms,
            duration_ms,
            finished: true,
        }
    }

    pub fn position(&self) -> Duration {
        Duration::from_millis(self.position_ms)
    }

    /// Playback progress in `0.0..=1.0`; `0.0` while the duration is unknown.
    pub fn fraction(&self) -> f32 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        (self.position_ms as f64 / self.duration_ms as f64).clamp(0.0, 1.0) as f32
    }
}

/// Unique identifier for one acquired handle lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackHandleId(Uuid);

impl PlaybackHandleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlaybackHandleId {
    fn default() -> Self {
        Self::new()
    }
}

/// Acquires playback handles from the platform audio subsystem.
#[async_trait]
pub trait PlaybackHandleFactory: Send + Sync {
    /// Load `uri` and return a controllable handle.
    ///
    /// Fails when the URI cannot be opened (file removed after indexing,
    /// unsupported format, missing permission).
    async fn acquire(&self, uri: &str, options: AcquireOptions) -> Result<Box<dyn PlaybackHandle>>;
}

/// One loaded, controllable audio stream.
///
/// After [`release`](PlaybackHandle::release) the handle must not be used
/// again.
#[async_trait]
pub trait PlaybackHandle: Send + Sync {
    /// Begin or resume playback.
    async fn play(&self) -> Result<()>;

    /// Pause without releasing the stream.
    async fn pause(&self) -> Result<()>;

    /// Stop playback and rewind.
    async fn stop(&self) -> Result<()>;

    /// Free all native resources associated with the stream.
    async fn release(&self) -> Result<()>;

    /// Query the current status.
    async fn status(&self) -> Result<PlaybackStatus>;

    /// Subscribe to pushed status updates.
    ///
    /// Hosts without push notifications return
    /// [`BridgeError::NotAvailable`](crate::error::BridgeError::NotAvailable);
    /// the core then polls [`status`](PlaybackHandle::status) instead.
    async fn subscribe_status(&self) -> Result<Box<dyn PlaybackStatusStream>>;
}

/// Stream of status updates for a single handle.
#[async_trait]
pub trait PlaybackStatusStream: Send {
    /// Next status update. Returns `None` once the handle is released.
    async fn next(&mut self) -> Option<PlaybackStatus>;
}
