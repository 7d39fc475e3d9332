//! # Shared Bus - Directive Transport
//!
//! In-process stand-in for the message broker that sits between the
//! gateway and its managed nodes.
//!
//! ```text
//! ┌──────────────┐   Directive    ┌──────────────┐   Directive    ┌──────────────┐
//! │   Gateway    │ ─────────────→ │  Event Bus   │ ─────────────→ │ Managed node │
//! │              │ ←───────────── │              │ ←───────────── │              │
//! └──────────────┘   Response     └──────────────┘   Response     └──────────────┘
//! ```
//!
//! The bus knows nothing about correlation; it only carries envelopes.
//! Matching a response to its directive is the gateway's job.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{
    BusEvent, DirectiveEnvelope, EventFilter, EventTopic, ResponseEnvelope, ResponseStatus,
};
pub use publisher::{BusError, EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
