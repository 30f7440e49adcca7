//! Versecast projection-state model
//!
//! The shared value types for the projection sync subsystem: the singleton
//! `ProjectionState` record, the `StatePatch` partial update, and the
//! background theme tags. Decoding is deliberately lenient: a display
//! surface must never crash on a malformed payload, it falls back to the
//! idle/welcome state instead.
//!
//! # Conventions
//!
//! - Wire format is JSON with camelCase keys (one format for the local slot
//!   file and the hub protocol).
//! - `updated_at` is the recency stamp: stores reject patches that are older
//!   than the record they would overwrite.

pub mod patch;
pub mod state;
pub mod theme;

// Re-export main types
pub use patch::{SongSelection, StatePatch};
pub use state::ProjectionState;
pub use theme::BackgroundTheme;

/// Fixed identifier of the singleton projection record.
///
/// There is exactly one addressable projection channel system-wide; every
/// hub frame carries this id so a later multi-channel deployment can key
/// records by it.
pub const PROJECTION_RECORD_ID: &str = "00000000-0000-0000-0000-000000000000";
