//! Response correlator: matches inbound responses to pending directives.
//!
//! Flow:
//! 1. An adapter registers the directive's correlation ID with a waiter
//! 2. The adapter publishes the directive
//! 3. The listener task receives the node's response and calls `resolve()`
//! 4. The entry is removed and its waiter fired with the outcome
//!
//! Entries that never see a response are expired by the sweeper task, and
//! `stop()` releases everything still pending. All terminal transitions
//! go through a single `DashMap::remove`, so each correlation ID resolves
//! at most once. Waiters fire after removal, outside any shard lock.

mod pending;

pub use pending::{Completion, CorrelatorStats, DirectiveMode, DirectiveOutcome, StatsSnapshot};

use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::StreamExt;
use parking_lot::RwLock;
use receptor_telemetry::{
    log_directive_event, DIRECTIVES_COMPLETED, DIRECTIVES_PENDING, DIRECTIVES_REGISTERED,
    DIRECTIVE_ROUND_TRIP, LATE_RESPONSES,
};
use serde_json::Value;
use shared_bus::{ResponseEnvelope, ResponseStatus};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::correlation::CorrelationId;
use crate::domain::error::{DirectiveError, GatewayError};
use crate::domain::request::DirectiveRequest;
use crate::ports::outbound::{ResponseSource, ResponseStream};
use pending::{outcome_label, Delivery, PendingEntry, Waiter};

enum Lifecycle {
    Idle,
    Running(Vec<JoinHandle<()>>),
    Stopped,
}

/// Process-wide table of in-flight directives.
pub struct ResponseCorrelator {
    pending: DashMap<CorrelationId, PendingEntry>,
    /// Held for reading while registering, for writing while starting or
    /// stopping; no entry can slip in after `stop()` begins draining.
    state: RwLock<Lifecycle>,
    stats: CorrelatorStats,
    sweep_interval: Duration,
}

// Shared across the listener, the sweeper and caller tasks.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResponseCorrelator>();
};

impl ResponseCorrelator {
    /// Create a correlator that checks for expired entries every `sweep_interval`.
    pub fn new(sweep_interval: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            state: RwLock::new(Lifecycle::Idle),
            stats: CorrelatorStats::default(),
            sweep_interval,
        }
    }

    /// Subscribe to responses and spawn the listener and sweeper tasks.
    ///
    /// Calling `start()` on a running correlator does nothing. A stopped
    /// correlator cannot be restarted. Must be called from within a Tokio
    /// runtime.
    pub fn start(self: &Arc<Self>, source: &dyn ResponseSource) -> Result<(), GatewayError> {
        let mut state = self.state.write();
        match *state {
            Lifecycle::Running(_) => {
                debug!("Response correlator already running");
                return Ok(());
            }
            Lifecycle::Stopped => return Err(GatewayError::ShuttingDown),
            Lifecycle::Idle => {}
        }

        let responses = source.subscribe()?;
        let listener = tokio::spawn(listen(Arc::downgrade(self), responses));
        let sweeper = tokio::spawn(sweep(Arc::downgrade(self), self.sweep_interval));
        *state = Lifecycle::Running(vec![listener, sweeper]);

        info!(
            sweep_interval_ms = self.sweep_interval.as_millis(),
            "Response correlator started"
        );
        Ok(())
    }

    /// Stop the background tasks and release every pending directive with
    /// [`DirectiveError::ShuttingDown`].
    ///
    /// Idempotent. Returns the number of directives released.
    pub fn stop(&self) -> usize {
        let tasks = {
            let mut state = self.state.write();
            match std::mem::replace(&mut *state, Lifecycle::Stopped) {
                Lifecycle::Running(tasks) => tasks,
                Lifecycle::Idle => Vec::new(),
                Lifecycle::Stopped => return 0,
            }
        };

        for task in tasks {
            task.abort();
        }

        let released = self.drain(DirectiveError::ShuttingDown);
        info!(released = released, "Response correlator stopped");
        released
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.read(), Lifecycle::Running(_))
    }

    pub fn is_stopped(&self) -> bool {
        matches!(*self.state.read(), Lifecycle::Stopped)
    }

    /// Register a directive whose caller will await the outcome.
    pub fn register_blocking(
        &self,
        request: &DirectiveRequest,
        timeout: Duration,
    ) -> Result<oneshot::Receiver<DirectiveOutcome>, DirectiveError> {
        let (tx, rx) = oneshot::channel();
        self.register(request, Waiter::Blocking(tx), timeout)
            .map_err(|(error, _)| error)?;
        Ok(rx)
    }

    /// Register a directive whose outcome goes to `on_complete`.
    ///
    /// If registration is refused, `on_complete` has already been called
    /// with the returned error by the time this returns.
    pub fn register_callback(
        &self,
        request: &DirectiveRequest,
        timeout: Duration,
        on_complete: Completion,
    ) -> Result<(), DirectiveError> {
        self.register(request, Waiter::callback(on_complete), timeout)
            .map_err(|(error, waiter)| {
                waiter.fire(Err(error.clone()));
                error
            })
    }

    fn register(
        &self,
        request: &DirectiveRequest,
        waiter: Waiter,
        timeout: Duration,
    ) -> Result<(), (DirectiveError, Waiter)> {
        let correlation_id = request.correlation_id();
        let mode = waiter.mode();

        let state = self.state.read();
        match *state {
            Lifecycle::Idle => return Err((DirectiveError::NotStarted, waiter)),
            Lifecycle::Stopped => return Err((DirectiveError::ShuttingDown, waiter)),
            Lifecycle::Running(_) => {}
        }

        match self.pending.entry(correlation_id) {
            Entry::Occupied(_) => {
                return Err((DirectiveError::DuplicateCorrelationId(correlation_id), waiter));
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingEntry {
                    waiter,
                    created_at: Instant::now(),
                    timeout,
                    directive: request.directive().to_string(),
                    account: request.account().to_string(),
                    node_id: request.node_id().to_string(),
                    log_context: request.log_context().map(str::to_string),
                });
            }
        }
        drop(state);

        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
        DIRECTIVES_REGISTERED.inc();
        DIRECTIVES_PENDING.inc();

        log_directive_event!(
            debug,
            "Registered pending directive",
            correlation_id,
            request.account(),
            request.node_id(),
            directive = %request.directive(),
            mode = ?mode,
            timeout_ms = timeout.as_millis()
        );
        Ok(())
    }

    /// Deliver a node's response to the matching directive.
    ///
    /// Returns false if nothing was pending under `correlation_id`; such
    /// responses are logged and discarded.
    pub fn resolve(
        &self,
        correlation_id: CorrelationId,
        status: ResponseStatus,
        payload: Value,
    ) -> bool {
        let outcome = match status {
            ResponseStatus::Ok => Ok(payload),
            ResponseStatus::Failed => Err(DirectiveError::Remote(payload)),
        };

        if self.complete(correlation_id, outcome) {
            return true;
        }

        self.discard_late(&correlation_id.to_string());
        false
    }

    /// Terminate a directive with an arbitrary error.
    pub fn fail(&self, correlation_id: CorrelationId, error: DirectiveError) -> bool {
        self.complete(correlation_id, Err(error))
    }

    /// Terminate a directive with [`DirectiveError::Timeout`] now, whatever
    /// its deadline.
    pub fn expire(&self, correlation_id: CorrelationId) -> bool {
        match self.pending.remove(&correlation_id) {
            Some((id, entry)) => {
                let timeout = entry.timeout;
                self.finish(id, entry, Err(DirectiveError::Timeout(timeout)));
                true
            }
            None => false,
        }
    }

    /// Expire every entry past its deadline. Returns the number expired.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let overdue: Vec<CorrelationId> = self
            .pending
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| *entry.key())
            .collect();

        let mut expired = 0;
        for correlation_id in overdue {
            if let Some((id, entry)) = self
                .pending
                .remove_if(&correlation_id, |_, entry| entry.is_expired(now))
            {
                warn!(
                    correlation_id = %id,
                    directive = %entry.directive,
                    node_id = %entry.node_id,
                    timeout_ms = entry.timeout.as_millis(),
                    "Directive timed out"
                );
                let timeout = entry.timeout;
                self.finish(id, entry, Err(DirectiveError::Timeout(timeout)));
                expired += 1;
            }
        }
        expired
    }

    /// Number of directives awaiting a response
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check if a correlation ID is pending
    pub fn is_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.pending.contains_key(correlation_id)
    }

    /// Get statistics
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.pending.len())
    }

    /// Handle one envelope from the response stream.
    pub(crate) fn handle_response(&self, response: ResponseEnvelope) {
        let correlation_id = match CorrelationId::parse(&response.correlation_id) {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    correlation_id = %response.correlation_id,
                    node_id = %response.node_id,
                    error = %e,
                    "Discarding response with malformed correlation ID"
                );
                self.count_late();
                return;
            }
        };

        self.resolve(correlation_id, response.status, response.payload);
    }

    fn complete(&self, correlation_id: CorrelationId, outcome: DirectiveOutcome) -> bool {
        match self.pending.remove(&correlation_id) {
            Some((id, entry)) => {
                self.finish(id, entry, outcome);
                true
            }
            None => false,
        }
    }

    fn drain(&self, error: DirectiveError) -> usize {
        let ids: Vec<CorrelationId> = self.pending.iter().map(|entry| *entry.key()).collect();

        let mut released = 0;
        for correlation_id in ids {
            if let Some((id, entry)) = self.pending.remove(&correlation_id) {
                self.finish(id, entry, Err(error.clone()));
                released += 1;
            }
        }
        released
    }

    /// Record and deliver a terminal transition. The entry is already out
    /// of the table.
    fn finish(&self, correlation_id: CorrelationId, entry: PendingEntry, outcome: DirectiveOutcome) {
        let elapsed = entry.created_at.elapsed();
        let label = outcome_label(&outcome);

        self.stats.record(&outcome);
        DIRECTIVES_PENDING.dec();
        DIRECTIVES_COMPLETED.with_label_values(&[label]).inc();
        DIRECTIVE_ROUND_TRIP.observe(elapsed.as_secs_f64());

        log_directive_event!(
            debug,
            "Directive completed",
            correlation_id,
            entry.account,
            entry.node_id,
            directive = %entry.directive,
            log_context = entry.log_context.as_deref().unwrap_or_default(),
            outcome = label,
            elapsed_ms = elapsed.as_millis()
        );

        match entry.waiter.fire(outcome) {
            Delivery::Delivered => {}
            Delivery::Abandoned => {
                debug!(correlation_id = %correlation_id, "Caller stopped waiting before completion");
            }
            Delivery::Panicked => {
                error!(
                    correlation_id = %correlation_id,
                    directive = %entry.directive,
                    node_id = %entry.node_id,
                    "Completion callback panicked"
                );
            }
        }
    }

    fn discard_late(&self, correlation_id: &str) {
        warn!(
            correlation_id = %correlation_id,
            "Response for unknown or already resolved correlation ID"
        );
        self.count_late();
    }

    fn count_late(&self) {
        self.stats.total_late.fetch_add(1, Ordering::Relaxed);
        LATE_RESPONSES.inc();
    }
}

impl Drop for ResponseCorrelator {
    fn drop(&mut self) {
        if let Lifecycle::Running(tasks) = std::mem::replace(self.state.get_mut(), Lifecycle::Stopped) {
            for task in tasks {
                task.abort();
            }
        }
        self.drain(DirectiveError::ShuttingDown);
    }
}

/// Listener task: feeds every inbound response to the correlator.
async fn listen(correlator: Weak<ResponseCorrelator>, mut responses: ResponseStream) {
    while let Some(response) = responses.next().await {
        let Some(correlator) = correlator.upgrade() else {
            break;
        };
        correlator.handle_response(response);
    }
    debug!("Response stream ended");
}

/// Sweeper task: expires overdue entries on a fixed interval.
async fn sweep(correlator: Weak<ResponseCorrelator>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(correlator) = correlator.upgrade() else {
            break;
        };
        let expired = correlator.sweep_expired();
        if expired > 0 {
            debug!(expired = expired, "Swept expired directives");
        }
    }
}
