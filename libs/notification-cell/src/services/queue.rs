use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::NotificationError;
use crate::models::NotificationEvent;
use crate::services::email::{dispatch, NotificationDispatcher};

/// Where request handlers hand off notifications. Never blocks and never fails the caller.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: NotificationEvent);
}

/// Producer side of the notification channel.
#[derive(Clone)]
pub struct NotificationQueue {
    sender: mpsc::UnboundedSender<NotificationEvent>,
}

impl NotificationQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn enqueue(&self, event: NotificationEvent) -> Result<(), NotificationError> {
        self.sender
            .send(event)
            .map_err(|_| NotificationError::QueueClosed)
    }
}

impl NotificationSink for NotificationQueue {
    fn notify(&self, event: NotificationEvent) {
        let kind = event.kind();
        match self.enqueue(event) {
            Ok(()) => debug!("Queued {} notification", kind),
            Err(e) => error!("Dropping {} notification: {}", kind, e),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub sent: usize,
    pub failed: usize,
}

/// Drains the channel until every sender is dropped. Failed sends are logged
/// and counted, never retried.
pub fn spawn_notification_worker(
    dispatcher: Arc<dyn NotificationDispatcher>,
    mut receiver: mpsc::UnboundedReceiver<NotificationEvent>,
) -> JoinHandle<WorkerStats> {
    tokio::spawn(async move {
        info!("Notification worker started");
        let mut stats = WorkerStats::default();

        while let Some(event) = receiver.recv().await {
            match dispatch(dispatcher.as_ref(), &event).await {
                Ok(()) => {
                    stats.sent += 1;
                    debug!("Delivered {} notification to {}", event.kind(), event.recipient());
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!("Failed to deliver {} notification to {}: {}", event.kind(), event.recipient(), e);
                }
            }
        }

        info!("Notification worker stopped ({} sent, {} failed)", stats.sent, stats.failed);
        stats
    })
}

/// Keeps every event in memory; used by tests to observe side effects.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn count_of(&self, kind: &str) -> usize {
        self.events().iter().filter(|e| e.kind() == kind).count()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: NotificationEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
