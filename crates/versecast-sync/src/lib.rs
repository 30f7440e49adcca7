//! Projection sync client
//!
//! One abstraction, a singleton value with change notification,
//! instantiated twice: a slot file shared by every window on a device, and
//! a TCP hub shared across devices. Display surfaces and the operator
//! console use the same [`SyncClient`] façade over either backend.
//!
//! # Convergence model
//!
//! Best-effort, last-write-wins by stamp. Within one client, candidates
//! pass monotonic acceptance (a late out-of-order notification never
//! regresses the displayed state); across clients, everyone converges on
//! the newest accepted write. Transport and decode failures degrade to the
//! last known good state, never to a crash.
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use versecast_sync::{RemoteHubStore, SyncClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(RemoteHubStore::new("127.0.0.1:7411"));
//!     let client = SyncClient::connect(store).await;
//!
//!     let mut changes = client.watch();
//!     while changes.changed().await.is_ok() {
//!         let state = changes.borrow().clone();
//!         match state.current_verse() {
//!             Some(verse) => println!("{}", verse),
//!             None => println!("(welcome screen)"),
//!         }
//!     }
//! }
//! ```

pub mod client;
pub mod error;
pub mod local;
pub mod remote;
pub mod store;

// Re-exports
pub use client::SyncClient;
pub use error::{Result, SyncError};
pub use local::LocalSlotStore;
pub use remote::RemoteHubStore;
pub use store::{SharedStore, StoreSubscription};
