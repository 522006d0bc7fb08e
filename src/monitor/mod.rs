// src/monitor/mod.rs

//! Page-context activity monitor.
//!
//! One monitor runs per page context for the lifetime of that page. It
//! samples interaction counters on a fixed period, detects in-page (SPA)
//! navigations by watching the location, and emits `URL_CHANGED` /
//! `INTERACTION_UPDATE` events toward the coordinator. Sends are one-way and
//! unacknowledged; a dead coordinator channel degrades the monitor into a
//! harmless sampling loop rather than an error.

pub mod content;

pub use content::extract_page_text;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::browser::TabId;
use crate::config::CONFIG;
use crate::events::TrackerEvent;

/// The monitor's view of its page. Implementations read the live document;
/// tests script it.
pub trait PageProbe: Send + Sync {
    /// Current document title.
    fn title(&self) -> String;
    /// Current location.
    fn url(&self) -> String;
    /// Markup of the page's content root.
    fn html(&self) -> String;
    /// Drain the (scroll, key) counts accumulated by the page's passive
    /// listeners since the last drain.
    fn take_interactions(&self) -> (u64, u64);
}

pub struct PageActivityMonitor {
    tab: TabId,
    probe: Arc<dyn PageProbe>,
    events: mpsc::UnboundedSender<TrackerEvent>,
    period: Duration,
    content_max_chars: usize,
    last_url: String,
}

impl PageActivityMonitor {
    pub fn new(
        tab: TabId,
        probe: Arc<dyn PageProbe>,
        events: mpsc::UnboundedSender<TrackerEvent>,
    ) -> Self {
        let last_url = probe.url();
        Self {
            tab,
            probe,
            events,
            period: CONFIG.flush_interval(),
            content_max_chars: CONFIG.content_max_chars,
            last_url,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_content_cap(mut self, max_chars: usize) -> Self {
        self.content_max_chars = max_chars;
        self
    }

    /// Run the periodic flush loop until `cancel` fires. The first flush
    /// happens immediately; ticks never overlap and missed ticks are
    /// skipped, not replayed.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    async fn run(mut self, cancel: CancellationToken) {
        info!(
            "page monitor started for tab {} ({}ms period)",
            self.tab,
            self.period.as_millis()
        );

        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.flush(),
            }
        }

        debug!("page monitor for tab {} shut down", self.tab);
    }

    /// One flush: drain counters, detect navigation, emit messages.
    fn flush(&mut self) {
        let (scroll, key) = self.probe.take_interactions();
        let title = self.probe.title();
        let url = self.probe.url();
        let timestamp = Utc::now().timestamp_millis();

        // A location change since the last tick is an SPA navigation; only
        // then is a fresh snapshot extracted.
        let mut snapshot = None;
        if url != self.last_url {
            let content = extract_page_text(&self.probe.html(), self.content_max_chars);
            self.last_url = url.clone();
            self.send(TrackerEvent::UrlChanged {
                tab_id: self.tab,
                title: title.clone(),
                url: url.clone(),
                content: content.clone(),
                timestamp,
            });
            snapshot = Some(content);
        }

        self.send(TrackerEvent::InteractionUpdate {
            tab_id: self.tab,
            scroll_count: scroll,
            key_count: key,
            title,
            url,
            timestamp,
            content: snapshot,
        });
    }

    /// One-way, unacknowledged send. A closed channel means the coordinator
    /// is gone; the monitor keeps sampling regardless.
    fn send(&self, event: TrackerEvent) {
        if self.events.send(event).is_err() {
            debug!("coordinator gone, message from tab {} dropped", self.tab);
        }
    }
}
