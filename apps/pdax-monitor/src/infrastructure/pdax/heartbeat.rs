//! Heartbeat Manager
//!
//! PDAX drops connections that go quiet, independent of WebSocket pings.
//! The manager writes the application keepalive frame on a fixed schedule
//! through the session's shared sink until cancelled or a write fails.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt};
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::bootstrap::HEARTBEAT_FRAME;

/// Configuration for heartbeat timing.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Delay before the first heartbeat.
    pub initial_delay: Duration,
    /// Interval between heartbeats.
    pub interval: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            interval: Duration::from_secs(15),
        }
    }
}

impl HeartbeatConfig {
    /// Create a new configuration with custom values.
    #[must_use]
    pub const fn new(initial_delay: Duration, interval: Duration) -> Self {
        Self {
            initial_delay,
            interval,
        }
    }
}

/// Periodic keepalive writer.
///
/// The sink is shared with the session; every write holds the lock for the
/// duration of one frame.
pub struct HeartbeatManager<S> {
    config: HeartbeatConfig,
    sink: Arc<Mutex<S>>,
    cancel: CancellationToken,
}

impl<S> HeartbeatManager<S>
where
    S: Sink<Message> + Unpin + Send,
    S::Error: Display,
{
    /// Create a new heartbeat manager.
    #[must_use]
    pub const fn new(config: HeartbeatConfig, sink: Arc<Mutex<S>>, cancel: CancellationToken) -> Self {
        Self {
            config,
            sink,
            cancel,
        }
    }

    /// Run until cancelled or a heartbeat cannot be written.
    pub async fn run(self) {
        let start = Instant::now() + self.config.initial_delay;
        let mut interval = tokio::time::interval_at(start, self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut sent: u64 = 0;
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!(sent, "Heartbeat manager cancelled");
                    break;
                }
                _ = interval.tick() => {
                    let result = self
                        .sink
                        .lock()
                        .await
                        .send(Message::Binary(HEARTBEAT_FRAME.to_vec().into()))
                        .await;

                    if let Err(e) = result {
                        tracing::warn!(error = %e, sent, "Failed to send heartbeat, stopping");
                        break;
                    }
                    sent += 1;
                    tracing::trace!(sent, "Heartbeat sent");
                }
            }
        }
    }
}
