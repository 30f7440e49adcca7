use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use versecast_state::{ProjectionState, StatePatch};

use crate::store::{SharedStore, StoreSubscription};

/// Capacity of the notification queue between a store subscription and the
/// apply loop. Payloads are full records, so dropping behind just means
/// catching up to the newest one.
const CANDIDATE_QUEUE: usize = 16;

/// The per-process façade over a shared store: one observable
/// `ProjectionState` plus write-through publish.
///
/// Every display surface and the operator console use this identically;
/// which store backs it (slot file or hub) is invisible. There is no error
/// state: load or subscribe failures leave the client synced on idle, and
/// a failed write leaves the store at its previous value while the local
/// display already shows the operator's intent.
pub struct SyncClient {
    store: Arc<dyn SharedStore>,
    state_tx: Arc<watch::Sender<ProjectionState>>,
    subscription: Mutex<Option<StoreSubscription>>,
    apply_task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncClient {
    /// Load the current record, then subscribe to changes.
    ///
    /// Always returns a usable client: failures along the way are logged
    /// and degrade to the idle state (the live-event contract: a display
    /// surface never shows a broken state).
    pub async fn connect(store: Arc<dyn SharedStore>) -> Self {
        let initial = match store.load().await {
            Ok(Some(state)) => state,
            Ok(None) => ProjectionState::idle(),
            Err(e) => {
                warn!("Initial projection load failed, starting idle: {}", e);
                ProjectionState::idle()
            }
        };
        let state_tx = Arc::new(watch::channel(initial).0);

        let (tx, mut rx) = mpsc::channel(CANDIDATE_QUEUE);
        let subscription = match store.subscribe(tx).await {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                warn!(
                    "Projection subscription failed; holding last known state: {}",
                    e
                );
                None
            }
        };

        // Apply loop: monotonic acceptance. A late out-of-order
        // notification never regresses the displayed state.
        let apply_tx = Arc::clone(&state_tx);
        let apply_task = tokio::spawn(async move {
            while let Some(candidate) = rx.recv().await {
                apply_tx.send_if_modified(|current| {
                    if candidate.updated_at < current.updated_at {
                        debug!(
                            "Discarding stale candidate ({} < {})",
                            candidate.updated_at, current.updated_at
                        );
                        false
                    } else if candidate == *current {
                        false
                    } else {
                        *current = candidate;
                        true
                    }
                });
            }
        });

        Self {
            store,
            state_tx,
            subscription: Mutex::new(subscription),
            apply_task: Mutex::new(Some(apply_task)),
        }
    }

    /// The state currently held by this client.
    pub fn current_state(&self) -> ProjectionState {
        self.state_tx.borrow().clone()
    }

    /// A change stream for display surfaces to await re-renders on.
    pub fn watch(&self) -> watch::Receiver<ProjectionState> {
        self.state_tx.subscribe()
    }

    /// Stamp the patch with the write time, apply it to this client's own
    /// state immediately, then write through the store.
    ///
    /// The optimistic apply means a writer never waits on its own round
    /// trip; a failed store write is logged and leaves the shared record
    /// at its previous value until the next successful publish.
    pub async fn publish(&self, patch: StatePatch) {
        let patch = patch.stamped(Utc::now());

        self.state_tx.send_modify(|state| patch.apply_to(state));

        if let Err(e) = self.store.update(&patch).await {
            warn!("Projection write failed; shared record unchanged: {}", e);
        }
    }

    /// Publish a complete state (the operator console path: every
    /// user-visible change publishes the full record).
    pub async fn publish_state(&self, state: &ProjectionState) {
        self.publish(StatePatch::full(state)).await;
    }

    /// Clearing the selection is itself a write, never an omitted one.
    pub async fn clear(&self) {
        self.publish(StatePatch::clear()).await;
    }

    /// Release the subscription and stop applying notifications.
    ///
    /// Idempotent, and safe after a subscription that never came up. A
    /// notification in flight at teardown is discarded, not applied.
    pub fn shutdown(&self) {
        if let Ok(mut guard) = self.subscription.lock() {
            if let Some(mut subscription) = guard.take() {
                subscription.close();
            }
        }
        if let Ok(mut guard) = self.apply_task.lock() {
            if let Some(task) = guard.take() {
                task.abort();
            }
        }
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}
