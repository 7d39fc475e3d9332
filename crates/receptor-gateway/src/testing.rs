//! Stub ports shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use serde_json::json;
use tokio::sync::Notify;

use crate::correlator::ResponseCorrelator;
use crate::domain::auth::HeaderSet;
use crate::domain::error::{DirectiveError, GatewayError};
use crate::domain::request::{DirectiveParams, DirectiveRequest};
use crate::ports::outbound::{DirectivePublisher, ResponseSource, ResponseStream};

/// Response source that never yields.
pub(crate) struct SilentSource;

impl ResponseSource for SilentSource {
    fn subscribe(&self) -> Result<ResponseStream, GatewayError> {
        Ok(stream::pending().boxed())
    }
}

/// Publisher that accepts everything and counts it.
#[derive(Default)]
pub(crate) struct RecordingPublisher {
    published: AtomicUsize,
    notify: Notify,
}

impl RecordingPublisher {
    pub(crate) fn published(&self) -> usize {
        self.published.load(Ordering::SeqCst)
    }

    /// Wait until at least one directive has been published.
    pub(crate) async fn wait_for_publish(&self) {
        if self.published() == 0 {
            self.notify.notified().await;
        }
    }
}

#[async_trait]
impl DirectivePublisher for RecordingPublisher {
    async fn publish(&self, _request: &DirectiveRequest) -> Result<(), DirectiveError> {
        self.published.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_one();
        Ok(())
    }
}

/// Publisher whose bus is always down.
pub(crate) struct FailingPublisher;

#[async_trait]
impl DirectivePublisher for FailingPublisher {
    async fn publish(&self, _request: &DirectiveRequest) -> Result<(), DirectiveError> {
        Err(DirectiveError::Transport("broker unreachable".into()))
    }
}

pub(crate) fn request() -> DirectiveRequest {
    DirectiveRequest::new(
        DirectiveParams::new("0001", "node-a", "receptor:ping", json!({})),
        HeaderSet::new(),
    )
}

pub(crate) fn started_correlator_with_sweep(sweep_interval: Duration) -> Arc<ResponseCorrelator> {
    let correlator = Arc::new(ResponseCorrelator::new(sweep_interval));
    correlator
        .start(&SilentSource)
        .expect("silent source always subscribes");
    correlator
}

/// Correlator whose sweeper will not fire during a test.
pub(crate) fn started_correlator() -> Arc<ResponseCorrelator> {
    started_correlator_with_sweep(Duration::from_secs(3600))
}
