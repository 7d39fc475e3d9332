//! Outbound ports: what the gateway needs from the outside world.
//!
//! Production implementations live in `crate::adapters`; tests plug in
//! stubs.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use shared_bus::ResponseEnvelope;

use crate::domain::auth::HeaderSet;
use crate::domain::error::{DirectiveError, GatewayError};
use crate::domain::request::DirectiveRequest;

/// Stream of responses arriving from managed nodes.
pub type ResponseStream = BoxStream<'static, ResponseEnvelope>;

/// Hands a directive to the message bus.
#[async_trait]
pub trait DirectivePublisher: Send + Sync {
    /// Publish the directive, tagged with its correlation ID.
    ///
    /// Returns once the bus has accepted the directive; a failure here
    /// means the directive never left the gateway.
    async fn publish(&self, request: &DirectiveRequest) -> Result<(), DirectiveError>;
}

/// Source of inbound responses.
pub trait ResponseSource: Send + Sync {
    /// Open a subscription to the response topic.
    fn subscribe(&self) -> Result<ResponseStream, GatewayError>;
}

/// Raw HTTP reply to a status request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Single request/response HTTP call used by the connectivity probe.
#[async_trait]
pub trait StatusEndpoint: Send + Sync {
    /// POST a JSON body with the given headers.
    async fn post_json(
        &self,
        url: &str,
        headers: &HeaderSet,
        body: &Value,
    ) -> Result<HttpReply, GatewayError>;
}
