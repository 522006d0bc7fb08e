// src/bridge.rs

//! Native-messaging-style stdin adapter.
//!
//! The host process receives the browser-side event stream as one JSON
//! tracker event per line. Malformed lines and unknown tags are logged and
//! skipped — bad input from the extension must never take the coordinator
//! down. Monitor messages double as the metadata feed: their title/url pairs
//! are recorded into the [`TabRegistry`] before the event is forwarded, and
//! a removed tab is forgotten immediately, so any finalize still in flight
//! for it fails its lookup and is dropped.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::browser::TabRegistry;
use crate::events::TrackerEvent;

/// Pump events from `reader` into the tracker until EOF. Returns when the
/// input ends or the tracker has gone away.
pub async fn run_bridge<R>(
    reader: R,
    registry: Arc<TabRegistry>,
    events: mpsc::UnboundedSender<TrackerEvent>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: TrackerEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                warn!("ignoring malformed tracker event: {}", e);
                continue;
            }
        };

        match &event {
            TrackerEvent::InteractionUpdate {
                tab_id, title, url, ..
            }
            | TrackerEvent::UrlChanged {
                tab_id, title, url, ..
            } => {
                registry.record(*tab_id, title, url).await;
            }
            TrackerEvent::TabRemoved { tab_id } => {
                registry.forget(*tab_id).await;
            }
            TrackerEvent::TabActivated { .. } => {}
        }

        if events.send(event).is_err() {
            // Tracker ended; nothing left to feed.
            break;
        }
    }

    info!("event input closed, bridge shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::BufReader;

    async fn run_lines(
        input: &str,
    ) -> (Arc<TabRegistry>, Vec<TrackerEvent>) {
        let registry = Arc::new(TabRegistry::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        run_bridge(BufReader::new(input.as_bytes()), registry.clone(), tx)
            .await
            .unwrap();

        let mut forwarded = Vec::new();
        while let Ok(event) = rx.try_recv() {
            forwarded.push(event);
        }
        (registry, forwarded)
    }

    #[tokio::test]
    async fn forwards_events_in_arrival_order() {
        let input = concat!(
            r#"{"type":"TAB_ACTIVATED","tabId":1}"#,
            "\n",
            r#"{"type":"INTERACTION_UPDATE","tabId":1,"scrollCount":2,"keyCount":0,"title":"A","url":"https://a.test/","timestamp":10}"#,
            "\n",
            r#"{"type":"TAB_REMOVED","tabId":1}"#,
            "\n",
        );

        let (_registry, forwarded) = run_lines(input).await;
        assert_eq!(forwarded.len(), 3);
        assert_eq!(forwarded[0], TrackerEvent::TabActivated { tab_id: 1 });
        assert!(matches!(
            forwarded[1],
            TrackerEvent::InteractionUpdate { tab_id: 1, .. }
        ));
        assert_eq!(forwarded[2], TrackerEvent::TabRemoved { tab_id: 1 });
    }

    #[tokio::test]
    async fn malformed_and_unknown_lines_are_skipped() {
        let input = concat!(
            "not json at all\n",
            r#"{"type":"MOUSE_MOVED","tabId":1}"#,
            "\n",
            "\n",
            r#"{"type":"TAB_ACTIVATED","tabId":2}"#,
            "\n",
        );

        let (_registry, forwarded) = run_lines(input).await;
        assert_eq!(forwarded, vec![TrackerEvent::TabActivated { tab_id: 2 }]);
    }

    #[tokio::test]
    async fn monitor_messages_populate_the_registry() {
        use crate::browser::TabLookup;

        let input = concat!(
            r#"{"type":"URL_CHANGED","tabId":5,"title":"Changed","url":"https://b.test/x","content":"c","timestamp":1}"#,
            "\n",
        );

        let (registry, _) = run_lines(input).await;
        let meta = registry.tab_meta(5).await.unwrap();
        assert_eq!(meta.title, "Changed");
        assert_eq!(meta.url, "https://b.test/x");
    }

    #[tokio::test]
    async fn tab_removal_forgets_registry_metadata() {
        use crate::browser::TabLookup;

        let input = concat!(
            r#"{"type":"INTERACTION_UPDATE","tabId":9,"scrollCount":0,"keyCount":0,"title":"T","url":"u","timestamp":1}"#,
            "\n",
            r#"{"type":"TAB_REMOVED","tabId":9}"#,
            "\n",
        );

        let (registry, forwarded) = run_lines(input).await;
        assert_eq!(forwarded.len(), 2);
        assert!(registry.tab_meta(9).await.is_err());
    }
}
