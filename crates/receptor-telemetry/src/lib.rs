//! # Receptor Telemetry
//!
//! Logging and metrics for the receptor gateway.
//!
//! ## Components
//!
//! - **Tracing**: `tracing-subscriber` registry with an `EnvFilter` and a
//!   pretty or JSON formatting layer
//! - **Logging**: macros that stamp directive and probe log lines with
//!   their identifying fields
//! - **Metrics**: Prometheus counters, gauges and histograms for directive
//!   outcomes and connectivity probes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use receptor_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RECEPTOR_SERVICE_NAME` | `receptor-gateway` | Service name in the startup line |
//! | `RECEPTOR_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `RECEPTOR_JSON_LOGS` | `false` (`true` in containers) | JSON formatted output |
//! | `RECEPTOR_LOG_LOCATIONS` | `false` | Thread ids, files and lines |

mod config;
mod logging;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    gather_text, register_metrics, HistogramTimer, MetricsHandle, CONNECTION_PROBES,
    DIRECTIVES_COMPLETED, DIRECTIVES_PENDING, DIRECTIVES_REGISTERED, DIRECTIVE_ROUND_TRIP,
    LATE_RESPONSES, REGISTRY,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the tracing subscriber.
///
/// Returns a guard to be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    init_tracing(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
