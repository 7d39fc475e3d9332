//! # Bus Events
//!
//! Envelopes that travel over the bus: directives going out to managed
//! nodes and the responses those nodes send back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A directive addressed to a single managed node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveEnvelope {
    /// Correlation ID the response must echo back.
    pub correlation_id: String,
    /// Destination node.
    pub node_id: String,
    /// Tenant account the node belongs to.
    pub account: String,
    /// Directive name (e.g. "receptor:ping").
    pub directive: String,
    /// Directive body.
    pub payload: serde_json::Value,
    /// Outbound headers (content type and auth).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Outcome reported by the remote node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// The directive ran and produced a result.
    Ok,
    /// The node reported that the directive failed.
    Failed,
}

/// A response from a managed node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Correlation ID copied from the originating directive.
    pub correlation_id: String,
    /// Node that produced the response.
    pub node_id: String,
    /// Success or failure.
    pub status: ResponseStatus,
    /// Result body, or failure detail.
    pub payload: serde_json::Value,
}

impl ResponseEnvelope {
    /// Successful response.
    pub fn ok(
        correlation_id: impl Into<String>,
        node_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            node_id: node_id.into(),
            status: ResponseStatus::Ok,
            payload,
        }
    }

    /// Failure response.
    pub fn failed(
        correlation_id: impl Into<String>,
        node_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            node_id: node_id.into(),
            status: ResponseStatus::Failed,
            payload,
        }
    }
}

/// All events that can be published to the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BusEvent {
    /// Directive travelling from the gateway to a node.
    Directive(DirectiveEnvelope),
    /// Response travelling from a node to the gateway.
    Response(ResponseEnvelope),
}

impl BusEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::Directive(_) => EventTopic::Directives,
            Self::Response(_) => EventTopic::Responses,
        }
    }

    /// Node the event is addressed to or originates from.
    #[must_use]
    pub fn node_id(&self) -> &str {
        match self {
            Self::Directive(directive) => &directive.node_id,
            Self::Response(response) => &response.node_id,
        }
    }

    /// Correlation ID carried by the event.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        match self {
            Self::Directive(directive) => &directive.correlation_id,
            Self::Response(response) => &response.correlation_id,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Outbound directives.
    Directives,
    /// Inbound responses.
    Responses,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Nodes to include. Empty means all nodes.
    pub node_ids: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            node_ids: Vec::new(),
        }
    }

    /// Restrict the filter to the given nodes.
    #[must_use]
    pub fn for_nodes(mut self, node_ids: Vec<String>) -> Self {
        self.node_ids = node_ids;
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &BusEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let node_match = self.node_ids.is_empty()
            || self.node_ids.iter().any(|node| node == event.node_id());

        topic_match && node_match
    }
}
