//! Error types for directive dispatch and gateway startup.

use std::time::Duration;

use serde_json::Value;
use shared_bus::BusError;
use thiserror::Error;

use crate::domain::config::ConfigError;
use crate::domain::correlation::CorrelationId;

/// Terminal failure of a single directive.
///
/// Blocking callers receive it as `Err`, non-blocking callers as the
/// argument to their completion callback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectiveError {
    /// The directive could not be handed to the bus.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a failure response.
    #[error("remote error: {0}")]
    Remote(Value),

    /// No response arrived within the directive's timeout.
    #[error("no response within {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The correlator was stopped while the directive was pending.
    #[error("gateway is shutting down")]
    ShuttingDown,

    /// A directive with the same correlation ID is already pending.
    #[error("duplicate correlation id: {0}")]
    DuplicateCorrelationId(CorrelationId),

    /// The correlator has not been started yet.
    #[error("response correlator not started")]
    NotStarted,
}

/// Discriminant of [`DirectiveError`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveErrorKind {
    Transport,
    Remote,
    Timeout,
    ShuttingDown,
    DuplicateCorrelationId,
    NotStarted,
}

impl DirectiveError {
    /// Get the error kind
    pub fn kind(&self) -> DirectiveErrorKind {
        match self {
            Self::Transport(_) => DirectiveErrorKind::Transport,
            Self::Remote(_) => DirectiveErrorKind::Remote,
            Self::Timeout(_) => DirectiveErrorKind::Timeout,
            Self::ShuttingDown => DirectiveErrorKind::ShuttingDown,
            Self::DuplicateCorrelationId(_) => DirectiveErrorKind::DuplicateCorrelationId,
            Self::NotStarted => DirectiveErrorKind::NotStarted,
        }
    }
}

impl DirectiveErrorKind {
    /// Label used for the `outcome` metric dimension.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport_error",
            Self::Remote => "remote_error",
            Self::Timeout => "timeout",
            Self::ShuttingDown => "shutting_down",
            Self::DuplicateCorrelationId => "duplicate_correlation_id",
            Self::NotStarted => "not_started",
        }
    }
}

/// Gateway-level errors (startup, wiring, transport construction).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Bus subscription or publish failure
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    /// Operation refused because the gateway was stopped
    #[error("gateway is shutting down")]
    ShuttingDown,

    /// HTTP transport failure
    #[error("http error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}
