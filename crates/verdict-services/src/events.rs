//! Event log — append-only notification log plus a live broadcast feed.
//!
//! One event is appended per state transition, exactly once. The per-task
//! log is consumer-independent: a subscriber that lags and misses
//! broadcasts can re-read the full history by task id. Delivery is
//! best-effort; the log is the contract.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use verdict_core::{OracleEvent, TaskId};

/// Broadcast buffer size. A lagging receiver gets `RecvError::Lagged`
/// and falls back to the log.
const FEED_CAPACITY: usize = 1024;

pub struct EventLog {
    log: Arc<DashMap<TaskId, Vec<OracleEvent>>>,
    feed: broadcast::Sender<OracleEvent>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            log: Arc::new(DashMap::new()),
            feed,
        }
    }

    /// Append an event to the task's log and broadcast it.
    pub fn emit(&self, event: OracleEvent) {
        self.log
            .entry(event.task_id())
            .or_default()
            .push(event.clone());
        // No receivers is fine — the log still records the transition.
        let _ = self.feed.send(event);
    }

    /// Subscribe to the live feed. Receives events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<OracleEvent> {
        self.feed.subscribe()
    }

    /// Full event history for a task, in emission order.
    pub fn events_for(&self, task_id: &TaskId) -> Vec<OracleEvent> {
        self.log
            .get(task_id)
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of tasks with at least one event.
    pub fn task_count(&self) -> usize {
        self.log.len()
    }
}

impl Clone for EventLog {
    fn clone(&self) -> Self {
        Self {
            log: self.log.clone(),
            feed: self.feed.clone(),
        }
    }
}
