//! src/eventbus/mod.rs
//!
//! In-process alert bus with guaranteed delivery to multiple subscribers
//! via bounded MPSC queues. The session publishes; renderers subscribe.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch, Mutex};

use crate::platforms::twitch::events::StreamEvent;

/// One accepted, deduplicated, avatar-enriched event, ready to display.
#[derive(Debug, Clone)]
pub struct StreamAlert {
    /// Subscription type string, e.g. "channel.raid".
    pub kind: String,
    pub event: StreamEvent,
    pub avatar_url: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// Everything the bus carries. Renderers mostly care about `Alert`;
/// `System` is for lifecycle chatter worth surfacing.
#[derive(Debug, Clone)]
pub enum AlertEvent {
    Alert(StreamAlert),
    System(String),
}

impl AlertEvent {
    pub fn kind(&self) -> &str {
        match self {
            AlertEvent::Alert(alert) => &alert.kind,
            AlertEvent::System(_) => "system",
        }
    }
}

/// Each subscriber gets its own `mpsc::Sender<AlertEvent>` for guaranteed
/// delivery.
///
/// - If a subscriber's buffer fills, `publish` will await until there's
///   space (backpressure).
/// - If a subscriber has dropped its `Receiver`, sending to it simply fails
///   and the event still reaches everyone else.
#[derive(Clone)]
pub struct AlertBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<AlertEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Default size for each subscriber's buffer.
const DEFAULT_BUFFER_SIZE: usize = 512;

impl AlertBus {
    /// Create a new, empty alert bus.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which alerts will be delivered.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<AlertEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    /// Publish an event to all subscribers.
    pub async fn publish(&self, event: AlertEvent) {
        let senders = {
            let subs = self.subscribers.lock().await;
            subs.clone()
        };
        for s in senders {
            let _ = s.send(event.clone()).await;
        }
    }

    /// Convenience method: wrap an accepted event into a [`StreamAlert`]
    /// stamped with the current time and publish it.
    pub async fn publish_alert(&self, kind: &str, event: StreamEvent, avatar_url: Option<String>) {
        let alert = StreamAlert {
            kind: kind.to_string(),
            event,
            avatar_url,
            received_at: Utc::now(),
        };
        self.publish(AlertEvent::Alert(alert)).await;
    }
}

impl Default for AlertBus {
    fn default() -> Self {
        Self::new()
    }
}
