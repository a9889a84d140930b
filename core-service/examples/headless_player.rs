//! Headless player demonstration
//!
//! Scans a music directory, plays a few tracks through a simulated audio
//! host and shows the mini-player and radio mode.
//!
//! Run with:
//! ```bash
//! cargo run -p core-service --example headless_player -- ~/Music
//!
//! # JSON logs
//! cargo run -p core-service --example headless_player -- ~/Music json
//! ```

use anyhow::{bail, Context};
use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::logging::LogLevel;
use bridge_traits::playback::{
    AcquireOptions, PlaybackHandle, PlaybackHandleFactory, PlaybackStatus, PlaybackStatusStream,
};
use bridge_traits::prompt::{ConfirmationPrompt, ConfirmationRequest};
use bridge_traits::BridgeError;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::{CoreConfig, CoreService};
use std::env;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Pretend every track lasts this long.
const SIMULATED_TRACK_LENGTH: Duration = Duration::from_secs(3);

struct SimulatedHost;

#[async_trait]
impl PlaybackHandleFactory for SimulatedHost {
    async fn acquire(
        &self,
        uri: &str,
        options: AcquireOptions,
    ) -> BridgeResult<Box<dyn PlaybackHandle>> {
        info!(uri, looping = options.looping, "Simulated acquire");
        let started = options.autoplay.then(Instant::now);
        Ok(Box::new(SimulatedHandle {
            clock: Mutex::new(Clock {
                started,
                elapsed: Duration::ZERO,
            }),
        }))
    }
}

struct Clock {
    started: Option<Instant>,
    elapsed: Duration,
}

impl Clock {
    fn position(&self) -> Duration {
        self.elapsed + self.started.map(|s| s.elapsed()).unwrap_or_default()
    }
}

struct SimulatedHandle {
    clock: Mutex<Clock>,
}

impl SimulatedHandle {
    fn with_clock<T>(&self, f: impl FnOnce(&mut Clock) -> T) -> BridgeResult<T> {
        let mut clock = self
            .clock
            .lock()
            .map_err(|_| BridgeError::OperationFailed("clock poisoned".to_string()))?;
        Ok(f(&mut clock))
    }
}

#[async_trait]
impl PlaybackHandle for SimulatedHandle {
    async fn play(&self) -> BridgeResult<()> {
        self.with_clock(|c| {
            c.started.get_or_insert_with(Instant::now);
        })
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.with_clock(|c| {
            c.elapsed = c.position();
            c.started = None;
        })
    }

    async fn stop(&self) -> BridgeResult<()> {
        self.with_clock(|c| {
            c.elapsed = Duration::ZERO;
            c.started = None;
        })
    }

    async fn release(&self) -> BridgeResult<()> {
        Ok(())
    }

    async fn status(&self) -> BridgeResult<PlaybackStatus> {
        self.with_clock(|c| {
            let total = SIMULATED_TRACK_LENGTH.as_millis() as u64;
            let position = (c.position().as_millis() as u64).min(total);
            if position >= total {
                PlaybackStatus::finished(total)
            } else {
                PlaybackStatus::new(position, total)
            }
        })
    }

    async fn subscribe_status(&self) -> BridgeResult<Box<dyn PlaybackStatusStream>> {
        Err(BridgeError::NotAvailable("simulated host polls".to_string()))
    }
}

struct AlwaysConfirm;

#[async_trait]
impl ConfirmationPrompt for AlwaysConfirm {
    async fn confirm(&self, request: &ConfirmationRequest) -> bool {
        info!(title = %request.title, "Auto-confirming");
        true
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some(music_dir) = args.get(1) else {
        bail!("usage: headless_player <music-dir> [pretty|json|compact]");
    };
    let format = match args.get(2).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };

    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_level(LogLevel::Debug),
    )?;

    let db_path = env::temp_dir().join("mixtape-demo").join("store.db");
    let config = CoreConfig::builder()
        .database_path(db_path)
        .music_dir(music_dir)
        .playback_factory(std::sync::Arc::new(SimulatedHost))
        .confirmation_prompt(std::sync::Arc::new(AlwaysConfirm))
        .status_poll_interval(Duration::from_millis(250))
        .build()
        .context("building core config")?;

    let core = CoreService::bootstrap(config).await?;

    let rows = core.explore("").await?;
    info!(count = rows.len(), "Library scanned");
    for row in rows.iter().take(10) {
        info!("{:>6}  {}{}", row.duration, row.track.title, if row.is_favorite { "  ♥" } else { "" });
    }
    if rows.is_empty() {
        bail!("no audio files found in {}", music_dir);
    }

    let list: Vec<_> = rows.into_iter().map(|row| row.track).collect();
    core.toggle_favorite(&list[0]).await?;

    let name = core.create_playlist("Demo").await.or_else(|err| match err {
        core_service::CoreError::Library(core_library::LibraryError::AlreadyExists { .. }) => {
            Ok("Demo".to_string())
        }
        other => Err(other),
    })?;
    for track in list.iter().take(3) {
        core.add_to_playlist(&name, track).await?;
    }

    let mut player = core.mini_player();
    core.play(list[0].clone(), list.clone()).await;

    // Watch one track run out, then jump ahead and switch to radio.
    let deadline = Instant::now() + SIMULATED_TRACK_LENGTH * 2;
    while Instant::now() < deadline {
        let change = tokio::time::timeout(Duration::from_millis(500), player.changed()).await;
        if let Ok(Some(view)) = change {
            info!(
                title = %view.title,
                playing = view.is_playing,
                elapsed = %view.elapsed,
                "Mini-player"
            );
        }
    }

    player.next().await;
    core.start_radio().await;
    tokio::time::sleep(SIMULATED_TRACK_LENGTH * 2).await;
    info!(history = core.session().history().await.len(), "Tracks played");

    core.stop_radio().await;
    core.delete_playlist(&name).await?;
    core.shutdown().await;
    Ok(())
}
