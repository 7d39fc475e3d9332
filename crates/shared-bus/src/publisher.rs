//! # Event Publisher
//!
//! Defines the publishing side of the bus.

use crate::events::{BusEvent, EventFilter};
use crate::subscriber::{EventStream, EventSubscriber, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Errors raised by bus operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The bus has been closed; nothing can be published or subscribed.
    #[error("bus closed")]
    Closed,
}

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// Returns the number of subscribers that received the event.
    async fn publish(&self, event: BusEvent) -> Result<usize, BusError>;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-memory implementation of the bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
/// A deployment talking to a real broker supplies its own publisher and
/// subscriber implementations.
pub struct InMemoryEventBus {
    /// Broadcast sender; `None` once the bus is closed.
    sender: RwLock<Option<broadcast::Sender<BusEvent>>>,

    /// Active subscription count by topic.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Total events published.
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: RwLock::new(Some(sender)),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Get a stream of events matching a filter.
    pub fn event_stream(&self, filter: EventFilter) -> Result<EventStream, BusError> {
        self.subscribe(filter).map(EventStream::new)
    }

    /// Close the bus.
    ///
    /// Subscribers drain whatever is already buffered and then observe the
    /// end of their stream. Later publishes fail with [`BusError::Closed`].
    pub fn close(&self) {
        let Ok(mut sender) = self.sender.write() else {
            return;
        };
        if sender.take().is_some() {
            debug!("Bus closed");
        }
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.read().map(|s| s.is_none()).unwrap_or(true)
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(broadcast::Sender::receiver_count))
            .unwrap_or(0)
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Result<Subscription, BusError> {
        let receiver = {
            let sender = self.sender.read().map_err(|_| BusError::Closed)?;
            sender.as_ref().ok_or(BusError::Closed)?.subscribe()
        };
        let topic_key = format!("{:?}", filter.topics);

        if let Ok(mut subs) = self.subscriptions.write() {
            *subs.entry(topic_key.clone()).or_insert(0) += 1;
        }

        debug!(topics = ?filter.topics, nodes = ?filter.node_ids, "New subscription created");

        Ok(Subscription::new(
            receiver,
            filter,
            self.subscriptions.clone(),
            topic_key,
        ))
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: BusEvent) -> Result<usize, BusError> {
        let sender = {
            let guard = self.sender.read().map_err(|_| BusError::Closed)?;
            guard.as_ref().cloned().ok_or(BusError::Closed)?
        };

        let topic = event.topic();
        let correlation_id = event.correlation_id().to_string();

        self.events_published.fetch_add(1, Ordering::Relaxed);

        match sender.send(event) {
            Ok(receiver_count) => {
                debug!(
                    topic = ?topic,
                    correlation_id = %correlation_id,
                    receivers = receiver_count,
                    "Event published"
                );
                Ok(receiver_count)
            }
            Err(e) => {
                // A broker accepts messages nobody is consuming yet; so do we.
                warn!(
                    topic = ?topic,
                    correlation_id = %correlation_id,
                    error = %e,
                    "Event dropped (no receivers)"
                );
                Ok(0)
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
