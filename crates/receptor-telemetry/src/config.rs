//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error or a full directive)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Include thread ids and source locations in log lines
    pub verbose_locations: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "receptor-gateway".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            verbose_locations: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RECEPTOR_SERVICE_NAME`: Service name (default: receptor-gateway)
    /// - `RECEPTOR_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `RECEPTOR_JSON_LOGS`: Enable JSON logs (default: true in containers)
    /// - `RECEPTOR_LOG_LOCATIONS`: Include thread ids, files and lines (default: false)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("RECEPTOR_SERVICE_NAME")
                .unwrap_or_else(|_| "receptor-gateway".to_string()),

            log_level: env::var("RECEPTOR_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("RECEPTOR_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            verbose_locations: env::var("RECEPTOR_LOG_LOCATIONS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
