//! Gateway client: the entry point callers hold.
//!
//! Owns the correlator and the transports, resolves headers per call and
//! hands out [`Directive`]s.

use std::sync::Arc;

use parking_lot::RwLock;
use shared_bus::InMemoryEventBus;
use tracing::info;

use crate::adapters::{EventBusPublisher, EventBusResponses, ReqwestStatusEndpoint};
use crate::correlator::{ResponseCorrelator, StatsSnapshot};
use crate::directive::{BlockingDirective, Directive, DirectiveMode, NonBlockingDirective};
use crate::domain::auth::{request_headers, HeaderSet};
use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::domain::request::{DirectiveParams, DirectiveRequest};
use crate::domain::status::ConnectivityStatus;
use crate::ports::outbound::{DirectivePublisher, ResponseSource, StatusEndpoint};
use crate::probe::ConnectivityProbe;

/// Client for dispatching directives and probing node connectivity.
///
/// Share it as `Arc<GatewayClient>`; every method takes `&self`.
pub struct GatewayClient {
    config: GatewayConfig,
    correlator: Arc<ResponseCorrelator>,
    publisher: Arc<dyn DirectivePublisher>,
    responses: Arc<dyn ResponseSource>,
    probe: ConnectivityProbe,
    /// Forwarded when pre-shared-key auth does not apply
    identity_header: RwLock<Option<HeaderSet>>,
}

impl GatewayClient {
    /// Build a client over explicit transports.
    pub fn new(
        config: GatewayConfig,
        publisher: Arc<dyn DirectivePublisher>,
        responses: Arc<dyn ResponseSource>,
        status_endpoint: Arc<dyn StatusEndpoint>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;

        let correlator = Arc::new(ResponseCorrelator::new(config.timeouts.sweep_interval));
        let probe = ConnectivityProbe::new(config.connection_status_url(), status_endpoint);

        Ok(Self {
            config,
            correlator,
            publisher,
            responses,
            probe,
            identity_header: RwLock::new(None),
        })
    }

    /// Build a client that talks over `bus` and probes with `reqwest`.
    pub fn with_event_bus(
        config: GatewayConfig,
        bus: Arc<InMemoryEventBus>,
    ) -> Result<Self, GatewayError> {
        let endpoint = ReqwestStatusEndpoint::new(config.timeouts.http_request)?;
        Self::new(
            config,
            Arc::new(EventBusPublisher::new(Arc::clone(&bus))),
            Arc::new(EventBusResponses::new(bus)),
            Arc::new(endpoint),
        )
    }

    /// Start listening for responses. Idempotent while running.
    pub fn start(&self) -> Result<(), GatewayError> {
        self.correlator.start(self.responses.as_ref())?;
        info!(
            controller = %self.config.controller.host,
            psk_auth = self.config.auth.pre_shared_key.is_some(),
            "Gateway client started"
        );
        Ok(())
    }

    /// Stop listening and release all pending directives. Idempotent.
    pub fn stop(&self) {
        let released = self.correlator.stop();
        info!(released = released, "Gateway client stopped");
    }

    /// Ask the controller whether `node_id` is connected.
    pub async fn connection_status(&self, account: &str, node_id: &str) -> ConnectivityStatus {
        let headers = self.headers(account);
        self.probe.connection_status(account, node_id, &headers).await
    }

    /// Build a directive in the requested mode.
    ///
    /// Nothing is sent until the returned directive is executed.
    pub fn directive(&self, params: DirectiveParams, mode: DirectiveMode) -> Directive {
        let timeout = params.timeout.unwrap_or(self.config.timeouts.response);
        let headers = self.headers(&params.account);
        let request = DirectiveRequest::new(params, headers);
        let correlator = Arc::clone(&self.correlator);
        let publisher = Arc::clone(&self.publisher);

        match mode {
            DirectiveMode::Blocking => Directive::Blocking(BlockingDirective::new(
                request, timeout, correlator, publisher,
            )),
            DirectiveMode::NonBlocking => Directive::NonBlocking(NonBlockingDirective::new(
                request, timeout, correlator, publisher,
            )),
        }
    }

    /// Outbound headers for a call on behalf of `account`.
    pub fn headers(&self, account: &str) -> HeaderSet {
        let identity = self.identity_header.read();
        request_headers(&self.config.auth, account, identity.as_ref())
    }

    /// Set (or clear) the identity header forwarded when pre-shared-key
    /// auth does not apply.
    pub fn set_identity_header(&self, identity: Option<HeaderSet>) {
        *self.identity_header.write() = identity;
    }

    pub fn identity_header(&self) -> Option<HeaderSet> {
        self.identity_header.read().clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn correlator(&self) -> &Arc<ResponseCorrelator> {
        &self.correlator
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.correlator.stats()
    }
}
