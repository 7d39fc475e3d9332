//! # Receptor Gateway
//!
//! Client-side gateway that sends directives to receptor-managed nodes over
//! a message bus and routes their asynchronous responses back to callers.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  directive()  ┌───────────────┐ register ┌────────────────────┐
//! │   Caller   │ ────────────→ │ GatewayClient │ ───────→ │ ResponseCorrelator │
//! └────────────┘               └───────────────┘          │  (DashMap table)   │
//!       ↑                              │ publish          └────────────────────┘
//!       │ outcome                      ↓                        ↑ resolve
//!       │                      ┌───────────────┐  response  ┌──────────┐
//!       └───────────────────── │   Event Bus   │ ─────────→ │ listener │
//!                              └───────────────┘            └──────────┘
//! ```
//!
//! Two calling conventions share one correlator:
//! - **Blocking**: `execute().await` returns the node's response
//! - **Non-blocking**: `execute(callback)` returns after publishing; the
//!   callback receives the outcome later
//!
//! Every directive reaches exactly one terminal state: a value, a remote
//! error, a timeout, a transport error or `ShuttingDown`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use receptor_gateway::{DirectiveMode, DirectiveParams, GatewayClient, GatewayConfig};
//!
//! let bus = Arc::new(InMemoryEventBus::new());
//! let client = GatewayClient::with_event_bus(GatewayConfig::from_env()?, bus)?;
//! client.start()?;
//!
//! let params = DirectiveParams::new("0001", "node-a", "receptor:ping", json!({}));
//! let response = client
//!     .directive(params, DirectiveMode::Blocking)
//!     .into_blocking()
//!     .expect("blocking mode")
//!     .execute()
//!     .await?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod client;
pub mod correlator;
pub mod directive;
pub mod domain;
pub mod ports;
pub mod probe;

#[cfg(test)]
pub(crate) mod testing;

pub use client::GatewayClient;
pub use correlator::{Completion, DirectiveOutcome, ResponseCorrelator, StatsSnapshot};
pub use directive::{BlockingDirective, Directive, DirectiveMode, NonBlockingDirective};
pub use domain::{
    auth_headers, request_headers, ConfigError, ConnectivityStatus, CorrelationId,
    DirectiveError, DirectiveErrorKind, DirectiveParams, DirectiveRequest, GatewayConfig,
    GatewayError, HeaderSet, NodeStatus,
};
pub use probe::ConnectivityProbe;
