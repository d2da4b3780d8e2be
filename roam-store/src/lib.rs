#![warn(missing_docs)]
//! # roam-store
//!
//! Key-value storage capability consumed by the Roam HTTP API client.
//!
//! The client persists two kinds of state: cached GET response envelopes
//! and authorization token records. Both go through the [`KeyValueStore`]
//! trait — string keys, JSON string values — so any on-device storage
//! (or a plain in-memory map) can back the client.
//!
//! Values are serialized with serde_json via [`KeyValueStoreExt`]. A stored
//! value that no longer parses degrades to `None` on read instead of
//! failing the caller; corruption is logged and treated as absence.

mod error;
mod memory;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{KeyValueStore, KeyValueStoreExt, StoreResult};
