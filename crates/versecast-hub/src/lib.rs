//! Singleton-record projection hub
//!
//! This crate provides the TCP server behind the remote shared store: one
//! durable `ProjectionState` record, updatable by any writer, pushed in full
//! to every subscriber on every committed update. It manages multiple
//! concurrent subscriber connections and sends the current record to new
//! subscribers so late joiners converge immediately.
//!
//! # Features
//!
//! - TCP listener, newline-delimited JSON protocol
//! - Catch-up on connect (current record = a late joiner's `load`)
//! - Partial updates merged server-side, stale stamps dropped
//! - Broadcast to all subscribers, including the writer's own connection
//! - Dead subscriber pruning on failed sends
//!
//! # Protocol
//!
//! Requests (client → hub): `update` (record id + patch), `get` (record id).
//! Events (hub → client): `state`, always the full record, never a diff.
//!
//! # Example Usage
//!
//! ```no_run
//! use versecast_hub::ProjectionHub;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hub = ProjectionHub::new("0.0.0.0:7411");
//!     hub.start().await?;
//!
//!     // ... serve until shutdown ...
//!
//!     hub.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod hub;
pub mod protocol;
pub mod subscriber;

// Re-exports
pub use error::{HubError, Result};
pub use hub::ProjectionHub;
pub use protocol::{HubEvent, HubRequest, DEFAULT_HUB_PORT};
