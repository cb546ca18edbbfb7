//! Realtime push channel
//!
//! The server pushes full booking snapshots over a socket; this module turns
//! decoded frames into push actions and feeds them through the store so
//! every merge goes through the reducer like any other action.

use crate::actions::BookingAction;
use crate::store::SyncStore;
use crate::types::Booking;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// A decoded realtime frame
///
/// Wire format is `{"event": "...", "data": {...}}` with the event names the
/// server emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PushEvent {
    /// A booking was created elsewhere in the session's scope
    #[serde(rename = "booking:new")]
    New(Box<Booking>),
    /// A booking changed elsewhere
    #[serde(rename = "booking:statusUpdate")]
    StatusUpdate(Box<Booking>),
}

impl PushEvent {
    /// The action the reducer merges this frame with
    #[must_use]
    pub fn into_action(self) -> BookingAction {
        match self {
            Self::New(booking) => BookingAction::RemoteBookingCreated { booking },
            Self::StatusUpdate(booking) => BookingAction::RemoteStatusChanged { booking },
        }
    }
}

/// Consumes push frames and forwards them to the store
///
/// One consumer per session. The loop ends when the frame channel closes,
/// the shutdown signal fires, or the store stops accepting actions.
pub struct PushConsumer {
    name: String,
    frames: mpsc::Receiver<PushEvent>,
    store: SyncStore,
    shutdown: broadcast::Receiver<()>,
}

impl PushConsumer {
    /// Create a consumer for the given frame channel
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        frames: mpsc::Receiver<PushEvent>,
        store: SyncStore,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            name: name.into(),
            frames,
            store,
            shutdown,
        }
    }

    /// Spawn the consumer loop
    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(consumer = %self.name, "push consumer started");
            loop {
                tokio::select! {
                    _ = self.shutdown.recv() => {
                        tracing::info!(consumer = %self.name, "push consumer shutting down");
                        break;
                    }
                    frame = self.frames.recv() => {
                        match frame {
                            Some(event) => {
                                let action = event.into_action();
                                tracing::debug!(
                                    consumer = %self.name,
                                    event_type = action.event_type(),
                                    "forwarding push frame"
                                );
                                if self.store.send(action).await.is_err() {
                                    tracing::info!(
                                        consumer = %self.name,
                                        "store stopped accepting actions"
                                    );
                                    break;
                                }
                            },
                            None => {
                                tracing::warn!(consumer = %self.name, "push channel closed");
                                break;
                            },
                        }
                    }
                }
            }
        })
    }
}
