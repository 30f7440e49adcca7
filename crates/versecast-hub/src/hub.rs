use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use versecast_state::{ProjectionState, PROJECTION_RECORD_ID};

use crate::error::{HubError, Result};
use crate::protocol::{HubEvent, HubRequest};
use crate::subscriber::{Subscriber, SubscriberHandle, SubscriberManager};

/// The remote shared store backend: holds the singleton projection record
/// and pushes it in full to every subscriber on each committed update.
pub struct ProjectionHub {
    bind_addr: String,
    record: Arc<RwLock<ProjectionState>>,
    subscribers: SubscriberManager,
    accept_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    local_addr: Arc<RwLock<Option<SocketAddr>>>,
    running: Arc<RwLock<bool>>,
}

impl ProjectionHub {
    /// Create a new hub. The record starts idle; the first accepted write
    /// populates it.
    pub fn new(bind_addr: impl Into<String>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            record: Arc::new(RwLock::new(ProjectionState::idle())),
            subscribers: SubscriberManager::new(),
            accept_task: Arc::new(Mutex::new(None)),
            local_addr: Arc::new(RwLock::new(None)),
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Start the hub (listen for subscribers).
    pub async fn start(&self) -> Result<()> {
        let is_running = *self.running.read().await;
        if is_running {
            return Err(HubError::AlreadyRunning);
        }

        let listener = TcpListener::bind(&self.bind_addr).await?;
        let bound = listener.local_addr()?;
        *self.local_addr.write().await = Some(bound);

        tracing::info!("Projection hub listening on {}", bound);

        *self.running.write().await = true;

        // Spawn subscriber acceptance task
        let record = Arc::clone(&self.record);
        let subscribers = self.subscribers.clone();
        let running = Arc::clone(&self.running);

        let task = tokio::spawn(async move {
            loop {
                if !*running.read().await {
                    break;
                }

                match listener.accept().await {
                    Ok((stream, addr)) => {
                        tracing::info!("New subscriber connection from {}", addr);
                        let (read_half, write_half) = stream.into_split();
                        let mut subscriber = Subscriber::new(write_half);

                        // Catch-up: the current record doubles as load()
                        // for late joiners.
                        let snapshot = record.read().await.clone();
                        if let Err(e) = subscriber.send_catch_up(&snapshot).await {
                            tracing::warn!("Failed to send catch-up record: {}", e);
                            continue;
                        }

                        let handle: SubscriberHandle = Arc::new(Mutex::new(subscriber));
                        subscribers.add(Arc::clone(&handle)).await;

                        tokio::spawn(serve_connection(
                            read_half,
                            handle,
                            Arc::clone(&record),
                            subscribers.clone(),
                        ));
                    }
                    Err(e) => {
                        tracing::error!("Failed to accept subscriber: {}", e);
                    }
                }
            }
            tracing::info!("Subscriber acceptance task stopped");
        });

        *self.accept_task.lock().await = Some(task);

        Ok(())
    }

    /// Stop the hub, dropping the listener and all subscriber connections.
    pub async fn stop(&self) -> Result<()> {
        let is_running = *self.running.read().await;
        if !is_running {
            return Err(HubError::NotStarted);
        }

        *self.running.write().await = false;

        if let Some(task) = self.accept_task.lock().await.take() {
            task.abort();
        }

        self.subscribers.clear().await;
        *self.local_addr.write().await = None;

        tracing::info!("Projection hub stopped");
        Ok(())
    }

    /// Address the hub is bound to, once started. Useful with a port-0
    /// bind in tests.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read().await
    }

    /// Snapshot of the current record.
    pub async fn record(&self) -> ProjectionState {
        self.record.read().await.clone()
    }

    /// Get current subscriber count.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.count().await
    }
}

impl Drop for ProjectionHub {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.accept_task.try_lock() {
            if let Some(task) = guard.take() {
                task.abort();
            }
        }
    }
}

/// Read loop of one subscriber connection. Malformed lines are skipped;
/// the connection ends on EOF or a read error, and broadcast pruning
/// removes the matching write half once sends start failing.
async fn serve_connection(
    read_half: OwnedReadHalf,
    handle: SubscriberHandle,
    record: Arc<RwLock<ProjectionState>>,
    subscribers: SubscriberManager,
) {
    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<HubRequest>(&line) {
                    Ok(request) => handle_request(request, &handle, &record, &subscribers).await,
                    Err(e) => {
                        tracing::warn!("Skipping malformed request line: {}", e);
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Subscriber read error: {}", e);
                break;
            }
        }
    }
}

async fn handle_request(
    request: HubRequest,
    handle: &SubscriberHandle,
    record: &Arc<RwLock<ProjectionState>>,
    subscribers: &SubscriberManager,
) {
    match request {
        HubRequest::Update { record: id, patch } => {
            if id != PROJECTION_RECORD_ID {
                tracing::warn!("Ignoring update for unknown record {}", id);
                return;
            }

            let snapshot = {
                let mut current = record.write().await;
                if !patch.supersedes(&current) {
                    // Stale write: a designed no-op, not an error.
                    tracing::debug!(
                        "Dropping stale update ({} < {})",
                        patch.updated_at,
                        current.updated_at
                    );
                    return;
                }
                patch.apply_to(&mut current);
                current.clone()
            };

            // Push to every subscriber, the writer's own connection included.
            let event = HubEvent::State {
                record: id,
                state: snapshot,
            };
            subscribers.broadcast(&event).await;
        }
        HubRequest::Get { record: id } => {
            if id != PROJECTION_RECORD_ID {
                tracing::warn!("Ignoring get for unknown record {}", id);
                return;
            }

            let snapshot = record.read().await.clone();
            let event = HubEvent::State {
                record: id,
                state: snapshot,
            };
            let mut subscriber = handle.lock().await;
            if let Err(e) = subscriber.send_event(&event).await {
                tracing::debug!("Failed to answer get: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hub_starts_idle() {
        let hub = ProjectionHub::new("127.0.0.1:0");
        assert!(hub.record().await.is_idle());
        assert_eq!(hub.subscriber_count().await, 0);
        assert!(hub.local_addr().await.is_none());
    }

    #[tokio::test]
    async fn test_double_start_is_an_error() {
        let hub = ProjectionHub::new("127.0.0.1:0");
        hub.start().await.unwrap();
        assert!(matches!(hub.start().await, Err(HubError::AlreadyRunning)));
        hub.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_before_start_is_an_error() {
        let hub = ProjectionHub::new("127.0.0.1:0");
        assert!(matches!(hub.stop().await, Err(HubError::NotStarted)));
    }
}
