use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use versecast_state::{ProjectionState, PROJECTION_RECORD_ID};

use crate::error::Result;
use crate::protocol::HubEvent;

/// Write side of one subscriber connection.
pub struct Subscriber {
    writer: OwnedWriteHalf,
}

impl Subscriber {
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self { writer }
    }

    /// Send event to the subscriber.
    pub async fn send_event(&mut self, event: &HubEvent) -> Result<()> {
        let json_line = event.to_json_line()?;
        self.writer.write_all(json_line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Send the current record to a newly connected subscriber, so late
    /// joiners see the live projection without waiting for the next write.
    pub async fn send_catch_up(&mut self, state: &ProjectionState) -> Result<()> {
        let event = HubEvent::State {
            record: PROJECTION_RECORD_ID.to_string(),
            state: state.clone(),
        };
        self.send_event(&event).await
    }
}

/// Shared handle to one subscriber, kept both in the broadcast list and by
/// the connection's read task (for `get` replies).
pub type SubscriberHandle = Arc<Mutex<Subscriber>>;

/// Thread-safe subscriber list manager.
#[derive(Clone)]
pub struct SubscriberManager {
    subscribers: Arc<Mutex<Vec<SubscriberHandle>>>,
}

impl SubscriberManager {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a new subscriber.
    pub async fn add(&self, subscriber: SubscriberHandle) {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.push(subscriber);
        tracing::info!("Subscriber added. Total: {}", subscribers.len());
    }

    /// Broadcast an event to all subscribers, pruning dead ones.
    pub async fn broadcast(&self, event: &HubEvent) {
        let mut subscribers = self.subscribers.lock().await;
        let mut dead_indices = Vec::new();

        for (idx, handle) in subscribers.iter().enumerate() {
            let mut subscriber = handle.lock().await;
            if let Err(e) = subscriber.send_event(event).await {
                tracing::warn!("Failed to send to subscriber {}: {}", idx, e);
                dead_indices.push(idx);
            }
        }

        // Remove dead subscribers in reverse order
        for idx in dead_indices.iter().rev() {
            subscribers.remove(*idx);
            tracing::info!("Removed dead subscriber. Remaining: {}", subscribers.len());
        }
    }

    /// Get current subscriber count.
    pub async fn count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Drop every registered subscriber, closing their write halves.
    pub async fn clear(&self) {
        self.subscribers.lock().await.clear();
    }
}

impl Default for SubscriberManager {
    fn default() -> Self {
        Self::new()
    }
}
