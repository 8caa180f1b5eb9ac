//! # Event Publisher
//!
//! Publishing side of the bus: the async `EventPublisher` port the action
//! queue talks to, and the broadcast-backed `InMemoryEventBus` behind it.

use crate::events::{EventFilter, GameEvent};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::trace;

/// Port for publishing game events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event; returns how many subscribers received it.
    async fn publish(&self, event: GameEvent) -> usize;

    /// Events published so far, delivered or not.
    fn events_published(&self) -> u64;
}

/// Broadcast bus. Events published while nobody listens are discarded.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<GameEvent>,
    published: AtomicU64,
    unheard: AtomicU64,
}

impl InMemoryEventBus {
    /// Bus with `DEFAULT_CHANNEL_CAPACITY` slots per subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Bus with `capacity` slots per subscriber before it lags.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: AtomicU64::new(0),
            unheard: AtomicU64::new(0),
        }
    }

    /// Publish from synchronous code.
    pub fn emit(&self, event: GameEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let topic = event.topic();
        match self.sender.send(event) {
            Ok(receivers) => {
                trace!(?topic, receivers, "Event published");
                receivers
            }
            Err(_) => {
                self.unheard.fetch_add(1, Ordering::Relaxed);
                trace!(?topic, "Event discarded, no subscribers");
                0
            }
        }
    }

    /// Pull-style subscription.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Push-style subscription.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.sender.subscribe(), filter)
    }

    /// Live subscriptions and streams.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Events published while nobody was subscribed.
    #[must_use]
    pub fn events_unheard(&self) -> u64 {
        self.unheard.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: GameEvent) -> usize {
        self.emit(event)
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
