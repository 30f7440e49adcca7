use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use versecast_state::{ProjectionState, StatePatch};

use crate::error::Result;
use crate::store::{SharedStore, StoreSubscription};

/// Fallback re-read interval. File events are the fast path; the poll
/// covers contexts where they never fire (network mounts, a process
/// re-reading its own past writes after restart).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Same-device shared store: one slot file every window on the device
/// observes, with file-event notification and a polling fallback.
pub struct LocalSlotStore {
    slot_path: PathBuf,
    poll_interval: Duration,
}

impl LocalSlotStore {
    pub fn new(slot_path: impl Into<PathBuf>) -> Self {
        Self {
            slot_path: slot_path.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// The store over the system-wide well-known slot.
    pub fn default_slot() -> Result<Self> {
        Ok(Self::new(versecast_paths::slot_path()?))
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn slot_path(&self) -> &Path {
        &self.slot_path
    }

    fn ensure_parent(&self) -> std::io::Result<()> {
        if let Some(parent) = self.slot_path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Atomic replace: write to a sibling temp file, then rename over the
    /// slot so readers never observe a half-written payload.
    fn write_slot(&self, state: &ProjectionState) -> Result<()> {
        self.ensure_parent()?;
        let tmp_path = self.slot_path.with_extension("json.tmp");
        fs::write(&tmp_path, state.to_json()?)?;
        fs::rename(&tmp_path, &self.slot_path)?;
        Ok(())
    }
}

/// Lenient slot read: a missing file means "never written", and a broken
/// file decodes to idle rather than failing the reader.
fn read_slot(slot_path: &Path) -> Option<ProjectionState> {
    match fs::read(slot_path) {
        Ok(bytes) => Some(ProjectionState::decode(&bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            warn!("Failed to read projection slot {:?}: {}", slot_path, e);
            None
        }
    }
}

#[async_trait]
impl SharedStore for LocalSlotStore {
    async fn load(&self) -> Result<Option<ProjectionState>> {
        Ok(read_slot(&self.slot_path))
    }

    async fn update(&self, patch: &StatePatch) -> Result<()> {
        let mut state = read_slot(&self.slot_path).unwrap_or_else(ProjectionState::idle);
        if !patch.supersedes(&state) {
            debug!(
                "Dropping stale slot update ({} < {})",
                patch.updated_at, state.updated_at
            );
            return Ok(());
        }
        patch.apply_to(&mut state);
        self.write_slot(&state)
    }

    async fn subscribe(&self, tx: mpsc::Sender<ProjectionState>) -> Result<StoreSubscription> {
        let slot_path = self.slot_path.clone();
        let (kick_tx, mut kick_rx) = mpsc::unbounded_channel();

        // File events kick an immediate re-read. Watch the parent
        // directory, not the file: atomic replace recreates the slot.
        if let Err(e) = self.ensure_parent() {
            warn!("Could not create slot directory: {}", e);
        }
        let event_tx = kick_tx.clone();
        let watcher = match notify::recommended_watcher(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        let _ = event_tx.send(());
                    }
                }
                Err(e) => warn!("Slot watch error: {}", e),
            },
        ) {
            Ok(mut watcher) => {
                let dir = self
                    .slot_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                match watcher.watch(&dir, RecursiveMode::NonRecursive) {
                    Ok(()) => Some(watcher),
                    Err(e) => {
                        warn!("Slot watch unavailable, relying on polling: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                warn!("Slot watcher creation failed, relying on polling: {}", e);
                None
            }
        };

        let poll_interval = self.poll_interval;
        let task = tokio::spawn(async move {
            // Holding a sender keeps the kick channel open even if the
            // watcher is dropped early.
            let _keepalive = kick_tx;
            let mut ticker = tokio::time::interval(poll_interval);
            let mut last_forwarded: Option<ProjectionState> = None;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = kick_rx.recv() => {}
                }

                match read_slot(&slot_path) {
                    Some(state) => {
                        let accept = last_forwarded
                            .as_ref()
                            .map_or(true, |prev| state != *prev && state.updated_at >= prev.updated_at);
                        if accept {
                            if tx.send(state.clone()).await.is_err() {
                                break;
                            }
                            last_forwarded = Some(state);
                        }
                    }
                    None => {
                        // Slot removed: observers fall back to the welcome
                        // screen, keeping the stamp of the state they had.
                        if let Some(prev) = &last_forwarded {
                            if !prev.is_idle() {
                                let idle = ProjectionState::idle_at(prev.updated_at);
                                if tx.send(idle.clone()).await.is_err() {
                                    break;
                                }
                                last_forwarded = Some(idle);
                            }
                        }
                    }
                }
            }
        });

        Ok(StoreSubscription::new(vec![task], watcher))
    }

    async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.slot_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use versecast_state::SongSelection;

    fn select_song_patch(ms: i64) -> StatePatch {
        StatePatch {
            song: Some(SongSelection::Select {
                id: "42".to_string(),
                title: Some("Song".to_string()),
                artist: None,
                lyrics: vec!["L1".to_string(), "L2".to_string()],
            }),
            verse_index: Some(0),
            background_theme: None,
            updated_at: Utc.timestamp_millis_opt(ms).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_load_missing_slot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalSlotStore::new(dir.path().join("projection.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalSlotStore::new(dir.path().join("projection.json"));

        store.update(&select_song_patch(100)).await.unwrap();

        let state = store.load().await.unwrap().unwrap();
        assert_eq!(state.song_id.as_deref(), Some("42"));
        assert_eq!(state.current_verse(), Some("L1"));
    }

    #[tokio::test]
    async fn test_stale_update_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalSlotStore::new(dir.path().join("projection.json"));

        store.update(&select_song_patch(200)).await.unwrap();
        store
            .update(&StatePatch::verse(1).stamped(Utc.timestamp_millis_opt(100).unwrap()))
            .await
            .unwrap();

        let state = store.load().await.unwrap().unwrap();
        assert_eq!(state.verse_index, 0);
        assert_eq!(state.updated_at, Utc.timestamp_millis_opt(200).unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_slot_decodes_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let slot = dir.path().join("projection.json");
        fs::write(&slot, b"{ definitely broken").unwrap();

        let store = LocalSlotStore::new(&slot);
        let state = store.load().await.unwrap().unwrap();
        assert!(state.is_idle());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalSlotStore::new(dir.path().join("projection.json"));

        store.update(&select_song_patch(100)).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
