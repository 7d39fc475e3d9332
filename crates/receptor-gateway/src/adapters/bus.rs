//! Event bus adapters.
//!
//! Implement the directive and response ports over `shared-bus`.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use shared_bus::{BusEvent, EventFilter, EventPublisher, EventTopic, InMemoryEventBus};
use tracing::{debug, warn};

use crate::domain::error::{DirectiveError, GatewayError};
use crate::domain::request::DirectiveRequest;
use crate::ports::outbound::{DirectivePublisher, ResponseSource, ResponseStream};

/// Publishes directives as [`BusEvent::Directive`] events.
pub struct EventBusPublisher {
    bus: Arc<InMemoryEventBus>,
}

impl EventBusPublisher {
    pub fn new(bus: Arc<InMemoryEventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl DirectivePublisher for EventBusPublisher {
    async fn publish(&self, request: &DirectiveRequest) -> Result<(), DirectiveError> {
        let event = BusEvent::Directive(request.to_envelope());

        let receivers = self
            .bus
            .publish(event)
            .await
            .map_err(|e| DirectiveError::Transport(e.to_string()))?;

        if receivers == 0 {
            // The broker owns delivery; an unanswered directive times out.
            warn!(
                correlation_id = %request.correlation_id(),
                node_id = %request.node_id(),
                "No subscribers for directive"
            );
        } else {
            debug!(
                correlation_id = %request.correlation_id(),
                receivers = receivers,
                "Directive delivered to bus"
            );
        }

        Ok(())
    }
}

/// Subscribes to [`EventTopic::Responses`] on the bus.
pub struct EventBusResponses {
    bus: Arc<InMemoryEventBus>,
}

impl EventBusResponses {
    pub fn new(bus: Arc<InMemoryEventBus>) -> Self {
        Self { bus }
    }
}

impl ResponseSource for EventBusResponses {
    fn subscribe(&self) -> Result<ResponseStream, GatewayError> {
        let stream = self
            .bus
            .event_stream(EventFilter::topics(vec![EventTopic::Responses]))?;

        Ok(stream
            .filter_map(|event| async move {
                match event {
                    BusEvent::Response(response) => Some(response),
                    BusEvent::Directive(_) => None,
                }
            })
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::HeaderSet;
    use crate::domain::request::DirectiveParams;
    use serde_json::json;
    use shared_bus::{EventSubscriber, ResponseEnvelope};

    fn request() -> DirectiveRequest {
        DirectiveRequest::new(
            DirectiveParams::new("0001", "node-a", "receptor:ping", json!({"n": 1})),
            HeaderSet::new(),
        )
    }

    #[tokio::test]
    async fn test_publish_reaches_directive_subscribers() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut sub = bus
            .subscribe(EventFilter::topics(vec![EventTopic::Directives]))
            .unwrap();
        let publisher = EventBusPublisher::new(Arc::clone(&bus));

        let request = request();
        publisher.publish(&request).await.unwrap();

        match sub.recv().await {
            Some(BusEvent::Directive(envelope)) => {
                assert_eq!(envelope.correlation_id, request.correlation_id().to_string());
                assert_eq!(envelope.payload, json!({"n": 1}));
            }
            other => panic!("expected directive, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_accepted() {
        let bus = Arc::new(InMemoryEventBus::new());
        let publisher = EventBusPublisher::new(bus);
        assert!(publisher.publish(&request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_publish_on_closed_bus_is_transport_error() {
        let bus = Arc::new(InMemoryEventBus::new());
        bus.close();
        let publisher = EventBusPublisher::new(bus);

        let err = publisher.publish(&request()).await.unwrap_err();
        assert!(matches!(err, DirectiveError::Transport(_)));
    }

    #[tokio::test]
    async fn test_response_stream_skips_directives() {
        let bus = Arc::new(InMemoryEventBus::new());
        let responses = EventBusResponses::new(Arc::clone(&bus));
        let mut stream = responses.subscribe().unwrap();

        bus.publish(BusEvent::Directive(request().to_envelope()))
            .await
            .unwrap();
        bus.publish(BusEvent::Response(ResponseEnvelope::ok(
            "c-1",
            "node-a",
            json!({"result": "ok"}),
        )))
        .await
        .unwrap();

        let response = stream.next().await.unwrap();
        assert_eq!(response.correlation_id, "c-1");
    }

    #[tokio::test]
    async fn test_subscribe_on_closed_bus_fails() {
        let bus = Arc::new(InMemoryEventBus::new());
        bus.close();
        let responses = EventBusResponses::new(bus);
        assert!(matches!(responses.subscribe(), Err(GatewayError::Bus(_))));
    }
}
