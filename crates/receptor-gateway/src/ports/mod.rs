//! Ports (hexagonal boundaries).

pub mod outbound;

pub use outbound::{DirectivePublisher, HttpReply, ResponseSource, ResponseStream, StatusEndpoint};
