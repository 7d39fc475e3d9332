//! Domain layer: pure types and decisions with no I/O.

pub mod auth;
pub mod config;
pub mod correlation;
pub mod error;
pub mod request;
pub mod status;

pub use auth::{auth_headers, request_headers, HeaderSet};
pub use config::{AuthConfig, ConfigError, ControllerConfig, GatewayConfig, TimeoutConfig};
pub use correlation::CorrelationId;
pub use error::{DirectiveError, DirectiveErrorKind, GatewayError};
pub use request::{DirectiveParams, DirectiveRequest};
pub use status::{ConnectivityStatus, NodeStatus};
