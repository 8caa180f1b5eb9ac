//! # Shared Bus - Observable Game Events
//!
//! One-way observation surface for UI layers, analytics and tests.
//! Subsystems never call each other through the bus.
//!
//! ```text
//!   ActionQueue ──publish().await──┐
//!                                  ▼
//!                          ┌──────────────┐  subscribe()     ┌──────────┐
//!   GameSession ──emit()──►│ EventBus     │ ───────────────► │ UI/tests │
//!                          │ (broadcast)  │  event_stream()  └──────────┘
//!                          └──────────────┘
//! ```
//!
//! Only `GameEvent::TerminalFailure` is a guaranteed contract. The rest are
//! best-effort: discarded when nobody listens, skipped by readers that lag.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, GameEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Events buffered per subscriber before it lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
