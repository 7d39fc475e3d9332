//! Entries of the correlation table and their waiters.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::domain::error::DirectiveError;

/// Terminal result of a directive.
pub type DirectiveOutcome = Result<Value, DirectiveError>;

/// Callback run exactly once with a non-blocking directive's outcome.
pub type Completion = Box<dyn FnOnce(DirectiveOutcome) + Send + 'static>;

/// How the caller waits for a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectiveMode {
    /// The caller awaits the outcome.
    Blocking,
    /// The outcome is delivered to a callback.
    #[default]
    NonBlocking,
}

/// The party notified when an entry reaches its terminal state.
///
/// The callback sits behind a mutex so the table stays `Sync` without
/// requiring `Sync` closures from callers.
pub(crate) enum Waiter {
    Blocking(oneshot::Sender<DirectiveOutcome>),
    NonBlocking(Mutex<Completion>),
}

/// What happened when a waiter was fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    /// The blocking caller dropped its receiver.
    Abandoned,
    /// The completion callback panicked.
    Panicked,
}

impl Waiter {
    pub(crate) fn callback(on_complete: Completion) -> Self {
        Self::NonBlocking(Mutex::new(on_complete))
    }

    pub(crate) fn mode(&self) -> DirectiveMode {
        match self {
            Self::Blocking(_) => DirectiveMode::Blocking,
            Self::NonBlocking(_) => DirectiveMode::NonBlocking,
        }
    }

    /// Deliver the outcome. A panicking callback is contained here so the
    /// task that fired it keeps running.
    pub(crate) fn fire(self, outcome: DirectiveOutcome) -> Delivery {
        match self {
            Self::Blocking(sender) => match sender.send(outcome) {
                Ok(()) => Delivery::Delivered,
                Err(_) => Delivery::Abandoned,
            },
            Self::NonBlocking(callback) => {
                let callback = callback.into_inner();
                match panic::catch_unwind(AssertUnwindSafe(move || callback(outcome))) {
                    Ok(()) => Delivery::Delivered,
                    Err(_) => Delivery::Panicked,
                }
            }
        }
    }
}

impl fmt::Debug for Waiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Waiter").field(&self.mode()).finish()
    }
}

/// A directive awaiting its response.
#[derive(Debug)]
pub(crate) struct PendingEntry {
    pub(crate) waiter: Waiter,
    pub(crate) created_at: Instant,
    pub(crate) timeout: Duration,
    /// Directive name (for logging)
    pub(crate) directive: String,
    pub(crate) account: String,
    pub(crate) node_id: String,
    pub(crate) log_context: Option<String>,
}

impl PendingEntry {
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.timeout
    }
}

/// Counters kept by the correlator.
#[derive(Debug, Default)]
pub struct CorrelatorStats {
    pub(crate) total_registered: AtomicU64,
    pub(crate) total_resolved: AtomicU64,
    pub(crate) total_remote_errors: AtomicU64,
    pub(crate) total_timeouts: AtomicU64,
    pub(crate) total_shut_down: AtomicU64,
    pub(crate) total_transport_errors: AtomicU64,
    pub(crate) total_late: AtomicU64,
}

/// Point-in-time copy of [`CorrelatorStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Directives accepted into the table
    pub registered: u64,
    /// Resolved with a success response
    pub resolved: u64,
    /// Resolved with a failure response
    pub remote_errors: u64,
    /// Expired without a response
    pub timed_out: u64,
    /// Released by `stop()`
    pub shut_down: u64,
    /// Failed to publish
    pub transport_errors: u64,
    /// Responses that matched no pending directive
    pub late_discarded: u64,
    /// Currently pending
    pub pending: usize,
}

impl CorrelatorStats {
    pub(crate) fn snapshot(&self, pending: usize) -> StatsSnapshot {
        StatsSnapshot {
            registered: self.total_registered.load(Ordering::Relaxed),
            resolved: self.total_resolved.load(Ordering::Relaxed),
            remote_errors: self.total_remote_errors.load(Ordering::Relaxed),
            timed_out: self.total_timeouts.load(Ordering::Relaxed),
            shut_down: self.total_shut_down.load(Ordering::Relaxed),
            transport_errors: self.total_transport_errors.load(Ordering::Relaxed),
            late_discarded: self.total_late.load(Ordering::Relaxed),
            pending,
        }
    }

    /// Count one terminal transition under the counter for its outcome.
    pub(crate) fn record(&self, outcome: &DirectiveOutcome) {
        use crate::domain::error::DirectiveErrorKind as Kind;

        let counter = match outcome {
            Ok(_) => &self.total_resolved,
            Err(e) => match e.kind() {
                Kind::Remote => &self.total_remote_errors,
                Kind::Timeout => &self.total_timeouts,
                Kind::ShuttingDown => &self.total_shut_down,
                Kind::Transport | Kind::DuplicateCorrelationId | Kind::NotStarted => {
                    &self.total_transport_errors
                }
            },
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Metric label for a terminal outcome.
pub(crate) fn outcome_label(outcome: &DirectiveOutcome) -> &'static str {
    match outcome {
        Ok(_) => "value",
        Err(e) => e.kind().as_str(),
    }
}
