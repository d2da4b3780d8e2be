#![warn(missing_docs)]
//! # roam-core
//!
//! Core types for the Roam offline-aware HTTP API client.
//!
//! This crate provides the protocol vocabulary shared by the rest of the
//! workspace:
//!
//! - **Describe** outgoing requests ([`RequestDescriptor`], [`Body`])
//! - **Select** caching behavior ([`CacheMode`], [`CacheKey`])
//! - **Wrap** returned data ([`Envelope`], [`Pagination`], [`ResponseMessage`])
//! - **Report** failures ([`ApiError`])
//! - **Sense** connectivity ([`Reachability`])
//!
//! Everything here is transport-agnostic: the actual network execution and
//! storage capabilities live in sibling crates and consume these types.

pub mod cache;
pub mod envelope;
pub mod error;
pub mod reachability;
pub mod request;

pub use cache::{CacheKey, CacheMode, query_json};
pub use envelope::{Envelope, Pagination, ResponseMessage};
pub use error::{ApiError, OFFLINE_STATUS};
pub use reachability::{AlwaysOnline, Reachability, SharedReachability};
pub use request::{Body, MultipartPart, RequestDescriptor};

/// Raw byte data type used for response bodies.
/// `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
