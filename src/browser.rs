// src/browser.rs

//! Seam between the coordinator and the hosting browser.
//!
//! Tab metadata is only reachable through an asynchronous lookup that can
//! fail independently of the state transition that asked for it: by the time
//! a session is finalized the tab may already be gone. `TabLookup` makes
//! that failure an explicit result instead of a callback that never fires.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

/// Browser-assigned tab identifier.
pub type TabId = i64;

/// Live metadata for a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabMeta {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum TabLookupError {
    /// The tab closed or detached before the lookup ran.
    #[error("tab {0} no longer exists")]
    Gone(TabId),
    #[error("tab lookup backend failed: {0}")]
    Backend(String),
}

/// Asynchronous, fallible tab-metadata lookup.
#[async_trait]
pub trait TabLookup: Send + Sync {
    async fn tab_meta(&self, tab: TabId) -> Result<TabMeta, TabLookupError>;
}

/// Metadata registry fed by the event stream itself.
///
/// Monitor messages carry the title and URL of the page they came from; the
/// bridge records the latest pair per tab here and forgets the tab when it
/// closes. A lookup for a tab that was never heard from, or was already
/// forgotten, fails with [`TabLookupError::Gone`] — which is exactly the
/// tab-removal race the coordinator is specified to drop silently.
#[derive(Default)]
pub struct TabRegistry {
    tabs: RwLock<HashMap<TabId, TabMeta>>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest known title/url for a tab.
    pub async fn record(&self, tab: TabId, title: &str, url: &str) {
        let mut tabs = self.tabs.write().await;
        tabs.insert(
            tab,
            TabMeta {
                title: title.to_string(),
                url: url.to_string(),
            },
        );
    }

    /// Drop everything known about a tab.
    pub async fn forget(&self, tab: TabId) {
        let mut tabs = self.tabs.write().await;
        tabs.remove(&tab);
    }
}

#[async_trait]
impl TabLookup for TabRegistry {
    async fn tab_meta(&self, tab: TabId) -> Result<TabMeta, TabLookupError> {
        let tabs = self.tabs.read().await;
        tabs.get(&tab).cloned().ok_or(TabLookupError::Gone(tab))
    }
}
