#![warn(missing_docs)]
//! # roam
//!
//! Offline-aware HTTP API client.
//!
//! The crate ties the workspace together into one explicitly constructed
//! [`Client`]:
//!
//! - a **request pipeline** that defaults the content type, runs the
//!   [`AuthorizationContext`] over every outgoing request, resolves the
//!   base URL, executes the call through a pluggable [`Transport`] and
//!   normalizes every failure into an [`ApiError`] exactly once
//! - a **cache-aware GET** path with four [`CacheMode`]s and offline
//!   fallback backed by any [`KeyValueStore`]
//! - **request-state handles** ([`GetHandle`], [`PostHandle`],
//!   [`PutHandle`], [`DeleteHandle`]) tracking the loading/response/error
//!   triple per call site, with cancellation on GET
//!
//! There are no process-wide singletons: every collaborator is injected,
//! so tests instantiate isolated clients freely.

mod client;
mod config;
mod handle;
mod transport;

pub use client::Client;
pub use config::{ClientConfig, RequestOptions};
pub use handle::{DeleteHandle, GetHandle, PostHandle, PutHandle, RequestState};
pub use transport::{Transport, TransportError, TransportResponse};

// Re-export the vocabulary crates for convenience.
pub use roam_auth::{
    AuthorizationContext, AuthorizationStrategy, JwtStrategy, OAuth2Strategy, RefreshTokens,
    TokenRecord,
};
pub use roam_core::{
    AlwaysOnline, ApiError, Body, CacheKey, CacheMode, Envelope, MultipartPart, OFFLINE_STATUS,
    Pagination, Reachability, RequestDescriptor, ResponseMessage, SharedReachability,
};
pub use roam_store::{KeyValueStore, KeyValueStoreExt, MemoryStore, StoreError};
