//! Directive calling conventions.
//!
//! Both conventions share the same correlator and publisher; they differ
//! only in how the outcome reaches the caller.

mod blocking;
mod non_blocking;

pub use blocking::BlockingDirective;
pub use non_blocking::NonBlockingDirective;

pub use crate::correlator::DirectiveMode;

use std::time::Duration;

use crate::domain::correlation::CorrelationId;
use crate::domain::request::DirectiveRequest;

/// A directive built by the client, ready to execute in its chosen mode.
pub enum Directive {
    Blocking(BlockingDirective),
    NonBlocking(NonBlockingDirective),
}

impl Directive {
    pub fn mode(&self) -> DirectiveMode {
        match self {
            Self::Blocking(_) => DirectiveMode::Blocking,
            Self::NonBlocking(_) => DirectiveMode::NonBlocking,
        }
    }

    pub fn request(&self) -> &DirectiveRequest {
        match self {
            Self::Blocking(directive) => directive.request(),
            Self::NonBlocking(directive) => directive.request(),
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.request().correlation_id()
    }

    pub fn timeout(&self) -> Duration {
        match self {
            Self::Blocking(directive) => directive.timeout(),
            Self::NonBlocking(directive) => directive.timeout(),
        }
    }

    pub fn into_blocking(self) -> Option<BlockingDirective> {
        match self {
            Self::Blocking(directive) => Some(directive),
            Self::NonBlocking(_) => None,
        }
    }

    pub fn into_non_blocking(self) -> Option<NonBlockingDirective> {
        match self {
            Self::NonBlocking(directive) => Some(directive),
            Self::Blocking(_) => None,
        }
    }
}
