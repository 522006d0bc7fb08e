// src/dispatch.rs

//! Best-effort telemetry delivery.
//!
//! One POST per finalized session, at-most-once. Failures are logged and
//! discarded: no retry, no queue, no backpressure. Under collector downtime
//! every event in that window is permanently lost, which is the accepted
//! delivery model for this tracker.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::config::CONFIG;
use crate::events::PageSessionEvent;

/// Consumer of finalized sessions. Infallible: delivery is fire-and-forget,
/// so there is nothing useful for a caller to do with an error.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, event: PageSessionEvent);
}

/// HTTP dispatcher posting each event to the local collector.
pub struct EventDispatcher {
    client: reqwest::Client,
    endpoint: String,
}

impl EventDispatcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config() -> Result<Self> {
        Self::new(&CONFIG.collector_url, CONFIG.http_timeout())
    }
}

#[async_trait]
impl EventSink for EventDispatcher {
    async fn deliver(&self, event: PageSessionEvent) {
        match self.client.post(&self.endpoint).json(&event).send().await {
            Ok(resp) => {
                debug!("delivered session event ({})", resp.status());
            }
            Err(e) => {
                debug!("collector unreachable, session event dropped: {}", e);
            }
        }
    }
}
