// src/events.rs

//! Wire types for the tracking core.
//!
//! Inbound events are a tagged union: two message kinds produced by page
//! monitors plus the two tab lifecycle signals from the hosting browser.
//! Unrecognized tags fail deserialization instead of being misread.
//! Outbound telemetry is the `PAGE_SESSION` event consumed by the collector.

use serde::{Deserialize, Serialize};

use crate::browser::TabId;

/// Tag carried by every outbound telemetry event.
pub const PAGE_SESSION: &str = "PAGE_SESSION";

/// Everything the session coordinator reacts to, in arrival order.
///
/// Field names follow the collector's camelCase wire convention so the same
/// types serve as both the in-process channel payload and the line-delimited
/// JSON format the bridge reads. `tabId` attributes each event to its tab
/// explicitly; there is no ambient sender identity on this channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum TrackerEvent {
    /// The user switched to this tab.
    #[serde(rename = "TAB_ACTIVATED", rename_all = "camelCase")]
    TabActivated { tab_id: TabId },

    /// The tab was closed. Its page context (and monitor) is already gone.
    #[serde(rename = "TAB_REMOVED", rename_all = "camelCase")]
    TabRemoved { tab_id: TabId },

    /// Periodic flush from a page monitor. Counts are the delta accumulated
    /// since the previous flush, not running totals. `content` is present
    /// only on ticks where an in-page navigation was detected.
    #[serde(rename = "INTERACTION_UPDATE", rename_all = "camelCase")]
    InteractionUpdate {
        tab_id: TabId,
        scroll_count: u64,
        key_count: u64,
        title: String,
        url: String,
        timestamp: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },

    /// The page's location changed without a full navigation (SPA route
    /// change). This is a session boundary for the active tab.
    #[serde(rename = "URL_CHANGED", rename_all = "camelCase")]
    UrlChanged {
        tab_id: TabId,
        title: String,
        url: String,
        content: String,
        timestamp: i64,
    },
}

impl TrackerEvent {
    /// The tab this event belongs to.
    pub fn tab_id(&self) -> TabId {
        match self {
            Self::TabActivated { tab_id }
            | Self::TabRemoved { tab_id }
            | Self::InteractionUpdate { tab_id, .. }
            | Self::UrlChanged { tab_id, .. } => *tab_id,
        }
    }
}

/// One finalized page session, as delivered to the collector.
///
/// Materialized exactly once per session boundary and never mutated after
/// construction. `title`/`url`/`scrollCount`/`keyCount` are absent on the
/// degraded event emitted when the tab closed before its metadata could be
/// read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageSessionEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub content: String,
    pub duration_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_count: Option<u64>,
    /// Send time, ms since epoch.
    pub timestamp: i64,
}
