//! Gateway configuration with validation.
//!
//! Sources, lowest precedence first: defaults, a TOML file, environment
//! variables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Client id sent with pre-shared-key authentication unless overridden.
pub const DEFAULT_CLIENT_ID: &str = "topological-inventory";

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Receptor controller location
    pub controller: ControllerConfig,
    /// Outbound authentication
    pub auth: AuthConfig,
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
}

impl GatewayConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text and validate it.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `RECEPTOR_*` environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RECEPTOR_CONTROLLER_SCHEME`: URL scheme of the controller
    /// - `RECEPTOR_CONTROLLER_HOST`: controller host and port
    /// - `RECEPTOR_CONTROLLER_PSK`: pre-shared key
    /// - `RECEPTOR_CLIENT_ID`: client id sent alongside the pre-shared key
    /// - `RECEPTOR_RESPONSE_TIMEOUT_SECS`: directive response timeout
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (environment or test map).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(scheme) = lookup("RECEPTOR_CONTROLLER_SCHEME") {
            self.controller.scheme = scheme;
        }
        if let Some(host) = lookup("RECEPTOR_CONTROLLER_HOST") {
            self.controller.host = host;
        }
        if let Some(psk) = lookup("RECEPTOR_CONTROLLER_PSK") {
            self.auth.pre_shared_key = Some(psk).filter(|k| !k.is_empty());
        }
        if let Some(client_id) = lookup("RECEPTOR_CLIENT_ID") {
            self.auth.client_id = client_id;
        }
        if let Some(secs) = lookup("RECEPTOR_RESPONSE_TIMEOUT_SECS") {
            let parsed = secs
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: "RECEPTOR_RESPONSE_TIMEOUT_SECS".into(),
                    value: secs.clone(),
                })?;
            self.timeouts.response = Duration::from_secs(parsed);
        }
        Ok(())
    }

    /// Full URL of the connection status endpoint.
    pub fn connection_status_url(&self) -> String {
        format!(
            "{}://{}{}",
            self.controller.scheme, self.controller.host, self.controller.connection_status_path
        )
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.controller.scheme.trim().is_empty() {
            return Err(ConfigError::Invalid("controller.scheme cannot be empty".into()));
        }

        if self.controller.host.trim().is_empty() {
            return Err(ConfigError::InvalidHost);
        }

        if !self.controller.connection_status_path.starts_with('/') {
            return Err(ConfigError::InvalidPath(
                self.controller.connection_status_path.clone(),
            ));
        }

        if self.auth.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.client_id cannot be empty".into()));
        }

        // Validate timeouts
        let timeouts = [
            ("response", self.timeouts.response),
            ("sweep_interval", self.timeouts.sweep_interval),
            ("http_request", self.timeouts.http_request),
        ];
        for (name, value) in timeouts {
            if value.is_zero() {
                return Err(ConfigError::InvalidTimeout(format!("{} cannot be 0", name)));
            }
        }

        Ok(())
    }
}

/// Receptor controller endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// URL scheme (`http` or `https`)
    pub scheme: String,
    /// Host and optional port
    pub host: String,
    /// Path of the connection status endpoint
    pub connection_status_path: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost:9090".to_string(),
            connection_status_path: "/connection/status".to_string(),
        }
    }
}

/// Outbound authentication configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Pre-shared key; when set (and an account is known) it replaces the
    /// caller's identity header
    pub pre_shared_key: Option<String>,
    /// Client id sent alongside the pre-shared key
    pub client_id: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pre_shared_key: None,
            client_id: DEFAULT_CLIENT_ID.to_string(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "pre_shared_key",
                &self.pre_shared_key.as_ref().map(|_| "<redacted>"),
            )
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long a directive waits for its response
    #[serde(with = "humantime_serde")]
    pub response: Duration,
    /// How often pending directives are checked for expiry
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
    /// Timeout for the connection status HTTP request
    #[serde(with = "humantime_serde")]
    pub http_request: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            response: Duration::from_secs(120),
            sweep_interval: Duration::from_secs(10),
            http_request: Duration::from_secs(30),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("cannot read configuration: {0}")]
    Io(String),
    /// Configuration file is not valid TOML for this schema
    #[error("cannot parse configuration: {0}")]
    Parse(String),
    /// Controller host missing
    #[error("controller host cannot be empty")]
    InvalidHost,
    /// Status path does not start with '/'
    #[error("invalid connection status path: {0}")]
    InvalidPath(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Environment variable with an unusable value
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: String, value: String },
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Duration (de)serialization as `"250ms"`, `"10s"` or `"2m"`.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" must be checked before the bare 's' and 'm' suffixes
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .ok()
                .and_then(|m| m.checked_mul(60))
                .map(Duration::from_secs)
                .ok_or("invalid minutes")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
