use async_trait::async_trait;
use notify::RecommendedWatcher;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use versecast_state::{ProjectionState, StatePatch};

use crate::error::Result;

/// A singleton value with change notification.
///
/// The one capability both persistence channels provide, so the client
/// logic cannot diverge between the local and remote paths.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Read the current record, if one has ever been written.
    async fn load(&self) -> Result<Option<ProjectionState>>;

    /// Merge a partial update into the record. The store is the source of
    /// truth for the merged result and must drop patches staler than the
    /// record they target.
    async fn update(&self, patch: &StatePatch) -> Result<()>;

    /// Start forwarding committed records into `tx`. Notification payloads
    /// are always the full record, never a diff. The returned subscription
    /// owns every background task involved.
    async fn subscribe(&self, tx: mpsc::Sender<ProjectionState>) -> Result<StoreSubscription>;

    /// Remove the record; observers fall back to the idle state.
    async fn clear(&self) -> Result<()>;
}

/// Handle to one active subscription.
///
/// Dropping it (or calling [`close`](Self::close)) stops the background
/// tasks and releases any file watcher. `close` is idempotent and safe to
/// call after a subscription that never fully came up.
pub struct StoreSubscription {
    tasks: Vec<JoinHandle<()>>,
    watcher: Option<RecommendedWatcher>,
}

impl StoreSubscription {
    pub(crate) fn new(tasks: Vec<JoinHandle<()>>, watcher: Option<RecommendedWatcher>) -> Self {
        Self { tasks, watcher }
    }

    pub(crate) fn from_task(task: JoinHandle<()>) -> Self {
        Self::new(vec![task], None)
    }

    /// Stop the subscription. Idempotent; never panics.
    pub fn close(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.watcher = None;
    }

    /// Whether the subscription still has live tasks.
    pub fn is_active(&self) -> bool {
        !self.tasks.is_empty()
    }
}

impl Drop for StoreSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let task = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        });
        let mut subscription = StoreSubscription::from_task(task);
        assert!(subscription.is_active());

        subscription.close();
        assert!(!subscription.is_active());
        subscription.close();
        subscription.close();
    }
}
