use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::theme::BackgroundTheme;

/// The singleton record describing what is currently projected.
///
/// Exactly one logical `ProjectionState` exists system-wide. Absence of a
/// song (or of lyrics) is the canonical idle/welcome state: surfaces render
/// their welcome screen, never a stale previous value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectionState {
    pub song_id: Option<String>,
    pub song_title: Option<String>,
    pub song_artist: Option<String>,
    /// Index into `lyrics`; 0 when unset, clamped on normalization.
    pub verse_index: usize,
    pub lyrics: Option<Vec<String>>,
    pub background_theme: BackgroundTheme,
    /// Write stamp used for recency comparison. Non-decreasing across
    /// accepted writes.
    pub updated_at: DateTime<Utc>,
}

impl ProjectionState {
    /// The idle/welcome state with the epoch stamp, so any real write
    /// supersedes it.
    pub fn idle() -> Self {
        Self::default()
    }

    /// The idle state carrying a given stamp (e.g. the stamp of the write
    /// that cleared the projection).
    pub fn idle_at(updated_at: DateTime<Utc>) -> Self {
        Self {
            updated_at,
            ..Self::default()
        }
    }

    /// Whether this state means "nothing projected".
    ///
    /// Single source of truth for both store paths: no song id, or no
    /// lyrics, or an empty lyric list.
    pub fn is_idle(&self) -> bool {
        self.song_id.is_none() || self.lyrics.as_ref().map_or(true, |l| l.is_empty())
    }

    /// Enforce the record invariants in place.
    ///
    /// Idle states are canonicalized (content fields cleared, theme and
    /// stamp kept); otherwise `verse_index` is clamped into the lyric range.
    pub fn normalize(&mut self) {
        if self.is_idle() {
            self.song_id = None;
            self.song_title = None;
            self.song_artist = None;
            self.lyrics = None;
            self.verse_index = 0;
        } else if let Some(lyrics) = &self.lyrics {
            if self.verse_index >= lyrics.len() {
                self.verse_index = lyrics.len() - 1;
            }
        }
    }

    /// The verse currently on screen, if any.
    pub fn current_verse(&self) -> Option<&str> {
        if self.is_idle() {
            return None;
        }
        self.lyrics
            .as_ref()
            .and_then(|l| l.get(self.verse_index))
            .map(String::as_str)
    }

    /// Encode for the slot file / wire. Infallible for well-formed states.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode a stored or received payload.
    ///
    /// Never fails: a structurally broken payload is logged and yields the
    /// idle state, and the result is always normalized.
    pub fn decode(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<ProjectionState>(bytes) {
            Ok(mut state) => {
                state.normalize();
                state
            }
            Err(e) => {
                warn!("Malformed projection payload, falling back to idle: {}", e);
                Self::idle()
            }
        }
    }
}
