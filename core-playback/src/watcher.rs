//! Status watcher for one playback handle lifetime.
//!
//! Prefers the handle's push stream. Hosts that answer `subscribe_status`
//! with `NotAvailable` are polled through `status()` at a fixed interval
//! instead. The task exits when its token is cancelled, when the stream ends
//! or when the listener returns `false`.

use bridge_traits::error::BridgeError;
use bridge_traits::playback::{PlaybackHandle, PlaybackStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Forwards statuses to `listener`, reporting `finished` once per pass.
///
/// Polled hosts keep answering `finished` while a stream sits at its end, so
/// only the transition into the finished state is forwarded as finished.
struct FinishDebounce<F> {
    listener: F,
    was_finished: bool,
}

impl<F> FinishDebounce<F>
where
    F: FnMut(PlaybackStatus) -> bool,
{
    fn forward(&mut self, mut status: PlaybackStatus) -> bool {
        let finished = status.finished;
        if finished && self.was_finished {
            status.finished = false;
        }
        self.was_finished = finished;
        (self.listener)(status)
    }
}

/// Spawn the watcher task.
pub(crate) fn spawn_status_watcher<F>(
    handle: Arc<dyn PlaybackHandle>,
    poll_interval: Duration,
    cancel: CancellationToken,
    listener: F,
) -> JoinHandle<()>
where
    F: FnMut(PlaybackStatus) -> bool + Send + 'static,
{
    tokio::spawn(async move {
        let mut debounce = FinishDebounce {
            listener,
            was_finished: false,
        };

        let stream = tokio::select! {
            _ = cancel.cancelled() => return,
            stream = handle.subscribe_status() => stream,
        };

        match stream {
            Ok(mut stream) => {
                debug!("Watching pushed playback status");
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        next = stream.next() => match next {
                            Some(status) => {
                                if !debounce.forward(status) {
                                    break;
                                }
                            }
                            None => break,
                        },
                    }
                }
            }
            Err(BridgeError::NotAvailable(_)) => {
                debug!(interval_ms = poll_interval.as_millis() as u64, "Polling playback status");
                let mut ticker = tokio::time::interval(poll_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            match handle.status().await {
                                Ok(status) => {
                                    if !debounce.forward(status) {
                                        break;
                                    }
                                }
                                Err(err) => trace!(error = %err, "Status poll failed"),
                            }
                        }
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "Playback status unavailable, progress will not update");
            }
        }
    })
}
