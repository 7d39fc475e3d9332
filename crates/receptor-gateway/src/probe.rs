//! Connectivity probe: asks the receptor controller whether a node is
//! reachable.
//!
//! One request per call, no retries. Every failure collapses into the
//! `{"status": "disconnected"}` fallback.

use std::sync::Arc;

use receptor_telemetry::{log_probe_event, CONNECTION_PROBES};
use serde_json::{json, Value};

use crate::domain::auth::HeaderSet;
use crate::domain::status::ConnectivityStatus;
use crate::ports::outbound::StatusEndpoint;

pub struct ConnectivityProbe {
    url: String,
    endpoint: Arc<dyn StatusEndpoint>,
}

impl ConnectivityProbe {
    pub fn new(url: impl Into<String>, endpoint: Arc<dyn StatusEndpoint>) -> Self {
        Self {
            url: url.into(),
            endpoint,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `{account, node_id}` and return the controller's answer.
    pub async fn connection_status(
        &self,
        account: &str,
        node_id: &str,
        headers: &HeaderSet,
    ) -> ConnectivityStatus {
        let body = json!({ "account": account, "node_id": node_id });

        let reply = match self.endpoint.post_json(&self.url, headers, &body).await {
            Ok(reply) => reply,
            Err(e) => {
                log_probe_event!(
                    error,
                    "Connection status request failed",
                    account,
                    node_id,
                    url = %self.url,
                    error = %e
                );
                return fallback();
            }
        };

        if !reply.is_success() {
            log_probe_event!(
                error,
                "Connection status request rejected",
                account,
                node_id,
                url = %self.url,
                status = reply.status,
                body = %reply.body
            );
            return fallback();
        }

        match serde_json::from_str::<Value>(&reply.body) {
            Ok(raw) => {
                let status = ConnectivityStatus::from_raw(raw);
                let result = status.status().as_label();
                CONNECTION_PROBES.with_label_values(&[result]).inc();
                log_probe_event!(debug, "Connection status received", account, node_id, result = result);
                status
            }
            Err(e) => {
                log_probe_event!(
                    error,
                    "Connection status body is not JSON",
                    account,
                    node_id,
                    error = %e
                );
                fallback()
            }
        }
    }
}

fn fallback() -> ConnectivityStatus {
    CONNECTION_PROBES.with_label_values(&["fallback"]).inc();
    ConnectivityStatus::disconnected()
}
