//! A single directive invocation.

use std::time::{Duration, Instant};

use serde_json::Value;
use shared_bus::DirectiveEnvelope;

use crate::domain::auth::HeaderSet;
use crate::domain::correlation::CorrelationId;

/// Caller-supplied arguments for one directive.
#[derive(Debug, Clone)]
pub struct DirectiveParams {
    pub account: String,
    pub node_id: String,
    /// Directive name, e.g. `receptor:ping`
    pub directive: String,
    pub payload: Value,
    /// Free-form text added to every log line about this directive
    pub log_context: Option<String>,
    /// Overrides the configured response timeout
    pub timeout: Option<Duration>,
}

impl DirectiveParams {
    pub fn new(
        account: impl Into<String>,
        node_id: impl Into<String>,
        directive: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            account: account.into(),
            node_id: node_id.into(),
            directive: directive.into(),
            payload,
            log_context: None,
            timeout: None,
        }
    }

    pub fn with_log_context(mut self, log_context: impl Into<String>) -> Self {
        self.log_context = Some(log_context.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Immutable description of a directive ready to be published.
///
/// Created by the client per call, with a fresh correlation ID and the
/// outbound headers resolved at creation time.
#[derive(Debug, Clone)]
pub struct DirectiveRequest {
    correlation_id: CorrelationId,
    directive: String,
    account: String,
    node_id: String,
    payload: Value,
    log_context: Option<String>,
    headers: HeaderSet,
    created_at: Instant,
}

impl DirectiveRequest {
    pub fn new(params: DirectiveParams, headers: HeaderSet) -> Self {
        Self::with_correlation_id(CorrelationId::new(), params, headers)
    }

    /// Build a request under a caller-chosen correlation ID.
    pub fn with_correlation_id(
        correlation_id: CorrelationId,
        params: DirectiveParams,
        headers: HeaderSet,
    ) -> Self {
        Self {
            correlation_id,
            directive: params.directive,
            account: params.account,
            node_id: params.node_id,
            payload: params.payload,
            log_context: params.log_context,
            headers,
            created_at: Instant::now(),
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn directive(&self) -> &str {
        &self.directive
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn log_context(&self) -> Option<&str> {
        self.log_context.as_deref()
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Envelope carried by the bus to the target node.
    pub fn to_envelope(&self) -> DirectiveEnvelope {
        DirectiveEnvelope {
            correlation_id: self.correlation_id.to_string(),
            node_id: self.node_id.clone(),
            account: self.account.clone(),
            directive: self.directive.clone(),
            payload: self.payload.clone(),
            headers: self.headers.clone(),
        }
    }
}
