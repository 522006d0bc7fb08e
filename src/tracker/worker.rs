// src/tracker/worker.rs

//! Channel consumer around [`SessionManager`].
//!
//! The worker is the single point where events enter the state machine: it
//! receives one event at a time and awaits the handler to completion before
//! taking the next, which is what makes every transition indivisible without
//! any locking around the session state.

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::events::TrackerEvent;
use crate::tracker::SessionManager;

/// Spawn the coordinator loop. Returns the event sender (clone freely for
/// monitors and the bridge) and the task handle. The loop ends once every
/// sender is dropped and the queue has drained.
pub fn spawn_tracker(
    mut manager: SessionManager,
) -> (mpsc::UnboundedSender<TrackerEvent>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<TrackerEvent>();

    let task = tokio::spawn(async move {
        info!("session tracker started");
        while let Some(event) = rx.recv().await {
            let now_ms = Utc::now().timestamp_millis();
            manager.handle(event, now_ms).await;
        }
        info!("session tracker stopped");
    });

    (tx, task)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::browser::{TabId, TabLookup, TabLookupError, TabMeta};
    use crate::dispatch::EventSink;
    use crate::events::PageSessionEvent;

    struct OneTab(TabId);

    #[async_trait]
    impl TabLookup for OneTab {
        async fn tab_meta(&self, tab: TabId) -> Result<TabMeta, TabLookupError> {
            if tab == self.0 {
                Ok(TabMeta {
                    title: "known".into(),
                    url: "https://known.test/".into(),
                })
            } else {
                Err(TabLookupError::Gone(tab))
            }
        }
    }

    #[derive(Default)]
    struct CountingSink(Mutex<Vec<PageSessionEvent>>);

    #[async_trait]
    impl EventSink for CountingSink {
        async fn deliver(&self, event: PageSessionEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn worker_drains_queue_in_order_and_stops_on_close() {
        let sink = Arc::new(CountingSink::default());
        let manager = SessionManager::new(Arc::new(OneTab(1)), sink.clone());
        let (tx, task) = spawn_tracker(manager);

        tx.send(TrackerEvent::TabActivated { tab_id: 1 }).unwrap();
        tx.send(TrackerEvent::TabActivated { tab_id: 2 }).unwrap();
        tx.send(TrackerEvent::TabRemoved { tab_id: 2 }).unwrap();
        drop(tx);

        task.await.unwrap();

        let events = sink.0.lock().unwrap();
        // Activating tab 2 finalized tab 1, removing tab 2 emitted the
        // degraded close event.
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title.as_deref(), Some("known"));
        assert_eq!(events[1].title, None);
    }
}
