//! HTTP adapter for the connection status endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::auth::HeaderSet;
use crate::domain::error::GatewayError;
use crate::ports::outbound::{HttpReply, StatusEndpoint};

/// [`StatusEndpoint`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestStatusEndpoint {
    client: reqwest::Client,
}

impl ReqwestStatusEndpoint {
    /// Build a client whose requests fail after `request_timeout`.
    pub fn new(request_timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl StatusEndpoint for ReqwestStatusEndpoint {
    async fn post_json(
        &self,
        url: &str,
        headers: &HeaderSet,
        body: &Value,
    ) -> Result<HttpReply, GatewayError> {
        // `headers` replaces the Content-Type that `json` sets rather than
        // appending a second one.
        let response = self
            .client
            .post(url)
            .json(body)
            .headers(header_map(headers))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(url = %url, status = status, "Status endpoint replied");

        Ok(HttpReply { status, body })
    }
}

/// Convert to a `reqwest` header map, one value per name.
fn header_map(headers: &HeaderSet) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!(header = %name, "Skipping header that is not valid HTTP"),
        }
    }
    map
}
