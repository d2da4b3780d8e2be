#![warn(missing_docs)]
//! # roam-reqwest
//!
//! [`Transport`](roam::Transport) implementation for the Roam client over
//! the `reqwest` HTTP client.
//!
//! ```no_run
//! use roam::{Client, ClientConfig, MemoryStore};
//! use roam_reqwest::ReqwestTransport;
//!
//! let client = Client::new(
//!     ReqwestTransport::new(),
//!     MemoryStore::new(),
//!     ClientConfig::new("https://api.example.com"),
//! );
//! ```

mod transport;

pub use transport::ReqwestTransport;
