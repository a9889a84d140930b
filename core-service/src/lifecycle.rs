//! Releases the playback handle when the host suspends the app.

use bridge_traits::lifecycle::{LifecycleObserver, LifecycleState};
use core_playback::AudioSession;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub(crate) fn spawn_lifecycle_watcher(
    observer: Arc<dyn LifecycleObserver>,
    session: AudioSession,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut changes = match observer.subscribe_changes().await {
            Ok(changes) => changes,
            Err(err) => {
                warn!(error = %err, "Lifecycle changes unavailable");
                return;
            }
        };

        loop {
            let state = tokio::select! {
                _ = cancel.cancelled() => break,
                state = changes.next() => state,
            };

            match state {
                Some(LifecycleState::Suspended) => {
                    info!("App suspended, releasing playback");
                    session.shutdown().await;
                }
                Some(state) => debug!(?state, "Lifecycle changed"),
                None => break,
            }
        }
        debug!("Lifecycle watcher stopped");
    })
}
