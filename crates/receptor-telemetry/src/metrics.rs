//! Prometheus metrics for directive dispatch and connectivity probes.
//!
//! All metrics follow the naming convention: `receptor_<object>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., directives_registered_total)
//! - **Gauge**: Value that can go up or down (e.g., directives_pending)
//! - **Histogram**: Distribution of values (e.g., directive_round_trip_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Registry holding every gateway metric
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DIRECTIVE METRICS
    // =========================================================================

    /// Directives accepted into the correlation table
    pub static ref DIRECTIVES_REGISTERED: Counter = Counter::new(
        "receptor_directives_registered_total",
        "Total number of directives registered for a response"
    ).expect("metric creation failed");

    /// Terminal transitions by outcome
    pub static ref DIRECTIVES_COMPLETED: CounterVec = CounterVec::new(
        Opts::new("receptor_directives_completed_total", "Directives reaching a terminal state"),
        &["outcome"]  // value/remote_error/timeout/shutting_down/transport_error
    ).expect("metric creation failed");

    /// Responses that arrived for an unknown or already resolved directive
    pub static ref LATE_RESPONSES: Counter = Counter::new(
        "receptor_late_responses_total",
        "Responses discarded because no pending directive matched"
    ).expect("metric creation failed");

    /// Directives currently awaiting a response
    pub static ref DIRECTIVES_PENDING: Gauge = Gauge::new(
        "receptor_directives_pending",
        "Number of directives awaiting a response"
    ).expect("metric creation failed");

    /// Time from registration to terminal transition
    pub static ref DIRECTIVE_ROUND_TRIP: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "receptor_directive_round_trip_seconds",
            "Time from directive registration to its terminal state"
        ).buckets(exponential_buckets(0.005, 2.0, 16).expect("valid bucket layout"))
    ).expect("metric creation failed");

    // =========================================================================
    // CONNECTIVITY METRICS
    // =========================================================================

    /// Connection status probes by result
    pub static ref CONNECTION_PROBES: CounterVec = CounterVec::new(
        Opts::new("receptor_connection_probes_total", "Connection status probes"),
        &["result"]  // connected/disconnected/other/fallback
    ).expect("metric creation failed");
}

/// Proof that the gateway metrics are registered.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    _private: (),
}

/// Register all metrics with the crate registry.
///
/// Safe to call more than once; metrics already registered are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Directives
        Box::new(DIRECTIVES_REGISTERED.clone()),
        Box::new(DIRECTIVES_COMPLETED.clone()),
        Box::new(LATE_RESPONSES.clone()),
        Box::new(DIRECTIVES_PENDING.clone()),
        Box::new(DIRECTIVE_ROUND_TRIP.clone()),
        // Connectivity
        Box::new(CONNECTION_PROBES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { _private: () })
}

/// Render all registered metrics in Prometheus text exposition format.
pub fn gather_text() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
