use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use versecast_hub::{HubEvent, HubRequest};
use versecast_state::{ProjectionState, StatePatch, PROJECTION_RECORD_ID};

use crate::error::{Result, SyncError};
use crate::store::{SharedStore, StoreSubscription};

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Cross-device shared store: a client of the projection hub.
///
/// `load` and `update` are one-shot connections; `subscribe` holds a
/// long-lived connection under a supervisor that reconnects with
/// exponential backoff. The hub's catch-up frame on every (re)connect
/// doubles as the repair for updates missed while disconnected.
pub struct RemoteHubStore {
    addr: String,
    record: String,
}

impl RemoteHubStore {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            record: PROJECTION_RECORD_ID.to_string(),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl SharedStore for RemoteHubStore {
    async fn load(&self) -> Result<Option<ProjectionState>> {
        let stream = TcpStream::connect(&self.addr).await?;
        let mut lines = BufReader::new(stream).lines();

        while let Some(line) = lines.next_line().await? {
            match serde_json::from_str::<HubEvent>(&line) {
                Ok(HubEvent::State { record, state }) if record == self.record => {
                    return Ok(Some(state));
                }
                Ok(HubEvent::State { record, .. }) => {
                    debug!("Skipping state for unknown record {}", record);
                }
                Err(e) => {
                    warn!("Skipping malformed hub frame: {}", e);
                }
            }
        }

        Err(SyncError::EmptyCatchUp)
    }

    async fn update(&self, patch: &StatePatch) -> Result<()> {
        let request = HubRequest::Update {
            record: self.record.clone(),
            patch: patch.clone(),
        };
        let line = request.to_json_line()?;

        let mut stream = TcpStream::connect(&self.addr).await?;
        stream.write_all(line.as_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn subscribe(&self, tx: mpsc::Sender<ProjectionState>) -> Result<StoreSubscription> {
        let addr = self.addr.clone();
        let record = self.record.clone();

        let task = tokio::spawn(async move {
            let mut backoff = INITIAL_BACKOFF;
            loop {
                match TcpStream::connect(&addr).await {
                    Ok(stream) => {
                        info!("Subscribed to projection hub at {}", addr);
                        backoff = INITIAL_BACKOFF;

                        let mut lines = BufReader::new(stream).lines();
                        loop {
                            match lines.next_line().await {
                                Ok(Some(line)) => {
                                    match serde_json::from_str::<HubEvent>(&line) {
                                        Ok(HubEvent::State {
                                            record: frame_record,
                                            state,
                                        }) if frame_record == record => {
                                            if tx.send(state).await.is_err() {
                                                // Consumer gone; end the supervisor.
                                                return;
                                            }
                                        }
                                        Ok(HubEvent::State {
                                            record: frame_record,
                                            ..
                                        }) => {
                                            debug!(
                                                "Skipping state for unknown record {}",
                                                frame_record
                                            );
                                        }
                                        Err(e) => {
                                            warn!("Skipping malformed hub frame: {}", e);
                                        }
                                    }
                                }
                                Ok(None) => {
                                    warn!("Hub connection closed, reconnecting");
                                    break;
                                }
                                Err(e) => {
                                    warn!("Hub read failed, reconnecting: {}", e);
                                    break;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Hub connect to {} failed: {}", addr, e);
                    }
                }

                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
            }
        });

        Ok(StoreSubscription::from_task(task))
    }

    async fn clear(&self) -> Result<()> {
        self.update(&StatePatch::clear().stamped(chrono::Utc::now()))
            .await
    }
}
