// src/tracker/mod.rs

//! Session coordinator.
//!
//! `SessionManager` owns the per-tab session state: the single active-session
//! pointer plus the interaction and content buffers. It is a plain value with
//! explicit handlers so the state machine can be tested by feeding it
//! synthetic events with synthetic clocks; [`worker::spawn_tracker`] wraps it
//! in a run-to-completion channel consumer for production use.
//!
//! Session boundaries are crossed on three triggers: tab switch, in-page
//! navigation within the active tab, and tab close. Each handler runs to
//! completion before the next event is processed, so no interaction or
//! navigation message can interleave inside a single transition.

mod worker;

pub use worker::spawn_tracker;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::browser::{TabId, TabLookup};
use crate::dispatch::EventSink;
use crate::events::{PageSessionEvent, TrackerEvent, PAGE_SESSION};

/// The process-wide active-session pointer: at most one session is active at
/// any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSession {
    pub tab: TabId,
    pub started_at_ms: i64,
}

/// Latest-known scroll/key counts reported by a tab's monitor. Overwritten
/// on every flush, zeroed at each session boundary for that tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionCounts {
    pub scroll: u64,
    pub key: u64,
}

pub struct SessionManager {
    active: Option<ActiveSession>,
    interactions: HashMap<TabId, InteractionCounts>,
    content: HashMap<TabId, String>,
    tabs: Arc<dyn TabLookup>,
    sink: Arc<dyn EventSink>,
}

impl SessionManager {
    pub fn new(tabs: Arc<dyn TabLookup>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            active: None,
            interactions: HashMap::new(),
            content: HashMap::new(),
            tabs,
            sink,
        }
    }

    /// Currently active session, if any.
    pub fn active_session(&self) -> Option<ActiveSession> {
        self.active
    }

    /// Buffered counts for a tab; zero if the tab has never reported.
    pub fn buffered_interactions(&self, tab: TabId) -> InteractionCounts {
        self.interactions.get(&tab).copied().unwrap_or_default()
    }

    /// Apply one event at `now_ms`. Callers must not interleave: each call
    /// is one indivisible transition.
    pub async fn handle(&mut self, event: TrackerEvent, now_ms: i64) {
        match event {
            TrackerEvent::TabActivated { tab_id } => {
                self.on_tab_activated(tab_id, now_ms).await;
            }
            TrackerEvent::TabRemoved { tab_id } => {
                self.on_tab_removed(tab_id, now_ms).await;
            }
            TrackerEvent::InteractionUpdate {
                tab_id,
                scroll_count,
                key_count,
                content,
                ..
            } => {
                self.on_interaction_update(tab_id, scroll_count, key_count, content);
            }
            TrackerEvent::UrlChanged {
                tab_id, content, ..
            } => {
                self.on_url_changed(tab_id, content, now_ms).await;
            }
        }
    }

    async fn on_tab_activated(&mut self, tab: TabId, now_ms: i64) {
        self.finalize_active(now_ms).await;
        self.active = Some(ActiveSession {
            tab,
            started_at_ms: now_ms,
        });
        debug!("session started for tab {}", tab);
    }

    /// In-page navigation. For the active tab this is a session boundary even
    /// though the tab identity does not change; the old session is finalized
    /// and a fresh one starts immediately with zeroed counters. For any other
    /// tab only the content snapshot is refreshed.
    async fn on_url_changed(&mut self, tab: TabId, content: String, now_ms: i64) {
        if self.active.map(|s| s.tab) == Some(tab) {
            self.finalize_active(now_ms).await;
            self.active = Some(ActiveSession {
                tab,
                started_at_ms: now_ms,
            });
            self.interactions.insert(tab, InteractionCounts::default());
            debug!("navigation boundary for tab {}", tab);
        }
        self.content.insert(tab, content);
    }

    /// Overwrite, not accumulate: the monitor already reports a flush-period
    /// delta.
    fn on_interaction_update(
        &mut self,
        tab: TabId,
        scroll: u64,
        key: u64,
        content: Option<String>,
    ) {
        self.interactions
            .insert(tab, InteractionCounts { scroll, key });
        if let Some(snapshot) = content {
            self.content.insert(tab, snapshot);
        }
    }

    /// Tab close. The tab object is already gone, so no metadata lookup is
    /// attempted: if the tab held the active session a degraded event goes
    /// out carrying only the buffered content and the duration. Buffers for
    /// the tab are dropped either way.
    async fn on_tab_removed(&mut self, tab: TabId, now_ms: i64) {
        if let Some(session) = self.active.take() {
            if session.tab == tab {
                let event = PageSessionEvent {
                    kind: PAGE_SESSION.to_string(),
                    title: None,
                    url: None,
                    content: self.content.get(&tab).cloned().unwrap_or_default(),
                    duration_ms: now_ms - session.started_at_ms,
                    scroll_count: None,
                    key_count: None,
                    timestamp: now_ms,
                };
                self.sink.deliver(event).await;
                debug!("closed tab {} ended the active session", tab);
            } else {
                self.active = Some(session);
            }
        }
        self.interactions.remove(&tab);
        self.content.remove(&tab);
    }

    /// Finalize the active session, if any. Buffered signals are captured
    /// before any boundary reset can touch them, then the asynchronous
    /// metadata lookup runs. A failed lookup abandons the emission — that
    /// session is lost — but the transition itself has already happened.
    async fn finalize_active(&mut self, now_ms: i64) {
        let Some(session) = self.active.take() else {
            return;
        };

        let counts = self.buffered_interactions(session.tab);
        let content = self
            .content
            .get(&session.tab)
            .cloned()
            .unwrap_or_default();

        match self.tabs.tab_meta(session.tab).await {
            Ok(meta) => {
                let event = PageSessionEvent {
                    kind: PAGE_SESSION.to_string(),
                    title: Some(meta.title),
                    url: Some(meta.url),
                    content,
                    duration_ms: now_ms - session.started_at_ms,
                    scroll_count: Some(counts.scroll),
                    key_count: Some(counts.key),
                    timestamp: now_ms,
                };
                self.sink.deliver(event).await;
            }
            Err(e) => {
                debug!("finalize for tab {} dropped: {}", session.tab, e);
            }
        }
    }
}
