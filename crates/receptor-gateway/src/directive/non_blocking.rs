//! Non-blocking calling convention: publish and return; the outcome is
//! delivered to a callback.

use std::sync::Arc;
use std::time::Duration;

use receptor_telemetry::log_directive_event;

use crate::correlator::{DirectiveOutcome, ResponseCorrelator};
use crate::domain::request::DirectiveRequest;
use crate::ports::outbound::DirectivePublisher;

/// A directive whose outcome is handed to a completion callback.
pub struct NonBlockingDirective {
    request: DirectiveRequest,
    timeout: Duration,
    correlator: Arc<ResponseCorrelator>,
    publisher: Arc<dyn DirectivePublisher>,
}

impl NonBlockingDirective {
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

    /// Publish the directive and return once the bus has taken it.
    ///
    /// `on_complete` runs exactly once: with the node's response, with a
    /// timeout from the sweeper, with `ShuttingDown` from `stop()`, or
    /// right away if the directive could not be registered or published.
    /// It runs on whichever task produced the outcome and must not block.
    /// A panic inside it is caught and logged.
    pub async fn execute<F>(self, on_complete: F)
    where
        F: FnOnce(DirectiveOutcome) + Send + 'static,
    {
        let correlation_id = self.request.correlation_id();

        if let Err(e) =
            self.correlator
                .register_callback(&self.request, self.timeout, Box::new(on_complete))
        {
            log_directive_event!(
                warn,
                "Directive rejected before publishing",
                correlation_id,
                self.request.account(),
                self.request.node_id(),
                directive = %self.request.directive(),
                error = %e
            );
            return;
        }

        match self.publisher.publish(&self.request).await {
            Ok(()) => {
                log_directive_event!(
                    info,
                    "Directive published",
                    correlation_id,
                    self.request.account(),
                    self.request.node_id(),
                    directive = %self.request.directive(),
                    log_context = self.request.log_context().unwrap_or_default()
                );
            }
            Err(e) => {
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
            }
        }
    }
}
