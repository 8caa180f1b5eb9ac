//! # Event Subscriber
//!
//! Pull (`Subscription`) and push (`EventStream`) views of the bus. Both
//! apply their filter on the receiving side.

use crate::events::{EventFilter, GameEvent};
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("Event bus closed")]
    Closed,
}

/// Filtered receiver handle.
///
/// A slow reader that falls more than the bus capacity behind skips the
/// oldest events; `lagged` counts how many.
pub struct Subscription {
    receiver: broadcast::Receiver<GameEvent>,
    filter: EventFilter,
    lagged: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<GameEvent>, filter: EventFilter) -> Self {
        Self {
            receiver,
            filter,
            lagged: 0,
        }
    }

    /// Next matching event; `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<GameEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => self.record_lag(skipped),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event if one is already buffered.
    pub fn try_recv(&mut self) -> Result<Option<GameEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => self.record_lag(skipped),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
            }
        }
    }

    /// Every matching event buffered right now, oldest first.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::iter::from_fn(|| self.try_recv().ok().flatten()).collect()
    }

    /// Events skipped because this reader fell behind.
    #[must_use]
    pub fn lagged(&self) -> u64 {
        self.lagged
    }

    /// The filter this subscription applies.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    fn record_lag(&mut self, skipped: u64) {
        self.lagged += skipped;
        debug!(skipped, total = self.lagged, "Subscriber lagged, events skipped");
    }
}

/// `Stream` of matching events, for `tokio_stream::StreamExt` combinators.
pub struct EventStream {
    inner: BroadcastStream<GameEvent>,
    filter: EventFilter,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<GameEvent>, filter: EventFilter) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
        }
    }
}

impl Stream for EventStream {
    type Item = GameEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Ok(event)) if self.filter.matches(&event) => return Poll::Ready(Some(event)),
                Some(Ok(_)) => {}
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    debug!(skipped, "Event stream lagged, events skipped");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}
