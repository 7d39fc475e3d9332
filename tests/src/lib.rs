//! # Receptor Gateway Test Suite
//!
//! Unified test crate for flows that cross crate boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── node.rs          # Simulated managed node answering over the bus
//!     ├── round_trip.rs    # Directive out, response back
//!     ├── shutdown.rs      # stop() and closed-bus behaviour
//!     └── connectivity.rs  # Status probe over real HTTP
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p rg-tests
//! cargo test -p rg-tests integration::round_trip::
//! ```

pub mod integration;
