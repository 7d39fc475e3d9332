//! Integration flows between the gateway and the bus.

pub mod connectivity;
pub mod node;
pub mod round_trip;
pub mod shutdown;
