//! Adapters implementing the outbound ports.

pub mod bus;
pub mod http;

pub use bus::{EventBusPublisher, EventBusResponses};
pub use http::ReqwestStatusEndpoint;
