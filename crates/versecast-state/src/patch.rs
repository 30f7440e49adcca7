use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::ProjectionState;
use crate::theme::BackgroundTheme;

/// Song selection carried by a patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SongSelection {
    /// Drop the current song; the record becomes idle.
    Clear,
    /// Project a song. Resets the verse pointer unless the patch also
    /// carries one.
    Select {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        artist: Option<String>,
        lyrics: Vec<String>,
    },
}

/// Partial update of the projection record.
///
/// Only the fields the operator console controls. Absent fields are left
/// untouched by the merge; the store holding the record is the single
/// source of truth for the merged result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song: Option<SongSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_theme: Option<BackgroundTheme>,
    /// Recency stamp. `SyncClient::publish` stamps this with the write
    /// time; stores drop patches older than the record they target.
    pub updated_at: DateTime<Utc>,
}

impl StatePatch {
    fn empty() -> Self {
        Self {
            song: None,
            verse_index: None,
            background_theme: None,
            updated_at: DateTime::<Utc>::default(),
        }
    }

    /// A patch reproducing a full state (the operator console publishes
    /// complete states on every user-visible change).
    pub fn full(state: &ProjectionState) -> Self {
        let song = match (&state.song_id, &state.lyrics) {
            (Some(id), Some(lyrics)) if !lyrics.is_empty() => SongSelection::Select {
                id: id.clone(),
                title: state.song_title.clone(),
                artist: state.song_artist.clone(),
                lyrics: lyrics.clone(),
            },
            _ => SongSelection::Clear,
        };
        Self {
            song: Some(song),
            verse_index: Some(state.verse_index),
            background_theme: Some(state.background_theme),
            updated_at: state.updated_at,
        }
    }

    /// Move the verse pointer, keeping the current song.
    pub fn verse(index: usize) -> Self {
        Self {
            verse_index: Some(index),
            ..Self::empty()
        }
    }

    /// Change the background theme only.
    pub fn theme(theme: BackgroundTheme) -> Self {
        Self {
            background_theme: Some(theme),
            ..Self::empty()
        }
    }

    /// Clear the projection; observers return to the welcome screen.
    pub fn clear() -> Self {
        Self {
            song: Some(SongSelection::Clear),
            ..Self::empty()
        }
    }

    /// Set the recency stamp.
    pub fn stamped(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Whether this patch may overwrite `state` under the monotonic rule.
    pub fn supersedes(&self, state: &ProjectionState) -> bool {
        self.updated_at >= state.updated_at
    }

    /// Merge into `state` and re-normalize. The caller is responsible for
    /// the staleness check (`supersedes`).
    pub fn apply_to(&self, state: &mut ProjectionState) {
        match &self.song {
            Some(SongSelection::Clear) => {
                state.song_id = None;
                state.song_title = None;
                state.song_artist = None;
                state.lyrics = None;
                state.verse_index = 0;
            }
            Some(SongSelection::Select {
                id,
                title,
                artist,
                lyrics,
            }) => {
                state.song_id = Some(id.clone());
                state.song_title = title.clone();
                state.song_artist = artist.clone();
                state.lyrics = Some(lyrics.clone());
                state.verse_index = self.verse_index.unwrap_or(0);
            }
            None => {
                if let Some(index) = self.verse_index {
                    state.verse_index = index;
                }
            }
        }
        if let Some(theme) = self.background_theme {
            state.background_theme = theme;
        }
        state.updated_at = self.updated_at;
        state.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn select_song() -> StatePatch {
        StatePatch {
            song: Some(SongSelection::Select {
                id: "42".to_string(),
                title: Some("Song".to_string()),
                artist: None,
                lyrics: vec!["L1".to_string(), "L2".to_string()],
            }),
            verse_index: Some(0),
            background_theme: Some(BackgroundTheme::Black),
            updated_at: stamp(100),
        }
    }

    #[test]
    fn test_select_replaces_content() {
        let mut state = ProjectionState::idle();
        select_song().apply_to(&mut state);

        assert_eq!(state.song_id.as_deref(), Some("42"));
        assert_eq!(state.current_verse(), Some("L1"));
        assert_eq!(state.updated_at, stamp(100));
    }

    #[test]
    fn test_verse_patch_keeps_lyrics() {
        let mut state = ProjectionState::idle();
        select_song().apply_to(&mut state);

        StatePatch::verse(1).stamped(stamp(101)).apply_to(&mut state);
        assert_eq!(state.current_verse(), Some("L2"));
        assert_eq!(state.song_id.as_deref(), Some("42"));
        assert_eq!(state.lyrics.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_out_of_range_verse_patch_is_clamped() {
        let mut state = ProjectionState::idle();
        select_song().apply_to(&mut state);

        StatePatch::verse(9).stamped(stamp(101)).apply_to(&mut state);
        assert_eq!(state.verse_index, 1);
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let mut state = ProjectionState::idle();
        select_song().apply_to(&mut state);

        StatePatch::clear().stamped(stamp(102)).apply_to(&mut state);
        assert!(state.is_idle());
        assert_eq!(state.updated_at, stamp(102));
    }

    #[test]
    fn test_new_selection_resets_verse_pointer() {
        let mut state = ProjectionState::idle();
        let mut first = select_song();
        first.verse_index = Some(1);
        first.apply_to(&mut state);
        assert_eq!(state.verse_index, 1);

        let second = StatePatch {
            song: Some(SongSelection::Select {
                id: "7".to_string(),
                title: None,
                artist: None,
                lyrics: vec!["x".to_string()],
            }),
            verse_index: None,
            background_theme: None,
            updated_at: stamp(200),
        };
        second.apply_to(&mut state);
        assert_eq!(state.verse_index, 0);
        assert_eq!(state.song_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_supersedes_is_monotonic() {
        let mut state = ProjectionState::idle();
        select_song().apply_to(&mut state);

        assert!(StatePatch::verse(1).stamped(stamp(100)).supersedes(&state));
        assert!(StatePatch::verse(1).stamped(stamp(101)).supersedes(&state));
        assert!(!StatePatch::verse(1).stamped(stamp(99)).supersedes(&state));
    }

    #[test]
    fn test_full_round_trips_through_apply() {
        let mut state = ProjectionState::idle();
        select_song().apply_to(&mut state);

        let mut rebuilt = ProjectionState::idle();
        StatePatch::full(&state).apply_to(&mut rebuilt);
        assert_eq!(rebuilt, state);
    }

    #[test]
    fn test_patch_serde_skips_absent_fields() {
        let json = serde_json::to_string(&StatePatch::verse(1).stamped(stamp(5))).unwrap();
        assert!(json.contains("\"verseIndex\":1"));
        assert!(!json.contains("song"));
        assert!(!json.contains("backgroundTheme"));

        let parsed: StatePatch = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.verse_index, Some(1));
        assert_eq!(parsed.song, None);
    }
}
