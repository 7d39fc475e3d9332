//! Blocking calling convention: publish, then await the outcome.

use std::sync::Arc;
use std::time::Duration;

use receptor_telemetry::log_directive_event;
use serde_json::Value;

use crate::correlator::ResponseCorrelator;
use crate::domain::error::DirectiveError;
use crate::domain::request::DirectiveRequest;
use crate::ports::outbound::DirectivePublisher;

/// A directive whose caller suspends until the node answers.
pub struct BlockingDirective {
    request: DirectiveRequest,
    timeout: Duration,
    correlator: Arc<ResponseCorrelator>,
    publisher: Arc<dyn DirectivePublisher>,
}

impl BlockingDirective {
    pub fn new(
        request: DirectiveRequest,
        timeout: Duration,
        correlator: Arc<ResponseCorrelator>,
        publisher: Arc<dyn DirectivePublisher>,
    ) -> Self {
        Self {
            request,
            timeout,
            correlator,
            publisher,
        }
    }

    pub fn request(&self) -> &DirectiveRequest {
        &self.request
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Publish the directive and wait for its response.
    ///
    /// The wait ends exactly at the deadline rather than at the next sweep;
    /// whichever of the deadline, the response or `stop()` removes the
    /// entry first decides the outcome.
    pub async fn execute(self) -> Result<Value, DirectiveError> {
        let correlation_id = self.request.correlation_id();
        let mut rx = self.correlator.register_blocking(&self.request, self.timeout)?;

        if let Err(e) = self.publisher.publish(&self.request).await {
            log_directive_event!(
                error,
                "Failed to publish directive",
                correlation_id,
                self.request.account(),
                self.request.node_id(),
                directive = %self.request.directive(),
                error = %e
            );
            self.correlator.fail(correlation_id, e);
        } else {
            log_directive_event!(
                info,
                "Directive published, awaiting response",
                correlation_id,
                self.request.account(),
                self.request.node_id(),
                directive = %self.request.directive(),
                log_context = self.request.log_context().unwrap_or_default()
            );
        }

        let outcome = match tokio::time::timeout(self.timeout, &mut rx).await {
            Ok(delivered) => delivered,
            Err(_elapsed) => {
                // Loses the race if a response or stop() already removed the entry;
                // either way the receiver now holds the single outcome.
                self.correlator.expire(correlation_id);
                rx.await
            }
        };

        // A dropped sender means the correlator went away with the entry.
        outcome.unwrap_or(Err(DirectiveError::ShuttingDown))
    }
}
