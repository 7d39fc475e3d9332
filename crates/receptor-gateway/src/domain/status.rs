//! Connectivity status reported by the receptor controller.

use serde_json::{json, Value};

/// Node state as reported in the `status` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeStatus {
    Connected,
    Disconnected,
    /// Any other value the controller reports, kept verbatim.
    Other(String),
}

impl NodeStatus {
    fn from_raw(raw: &Value) -> Self {
        match raw.get("status").and_then(Value::as_str) {
            Some("connected") => Self::Connected,
            Some("disconnected") => Self::Disconnected,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Other(String::new()),
        }
    }

    /// Metric label: `connected`, `disconnected` or `other`.
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Other(_) => "other",
        }
    }
}

/// Result of one connection status probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityStatus {
    status: NodeStatus,
    raw: Value,
}

impl ConnectivityStatus {
    /// Wrap the JSON body returned by the controller.
    pub fn from_raw(raw: Value) -> Self {
        Self {
            status: NodeStatus::from_raw(&raw),
            raw,
        }
    }

    /// The `{"status": "disconnected"}` value returned when the probe fails.
    pub fn disconnected() -> Self {
        Self {
            status: NodeStatus::Disconnected,
            raw: json!({ "status": "disconnected" }),
        }
    }

    pub fn status(&self) -> &NodeStatus {
        &self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status == NodeStatus::Connected
    }

    /// The body exactly as received (or the fallback body).
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }
}
