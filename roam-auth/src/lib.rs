#![warn(missing_docs)]
//! # roam-auth
//!
//! Pluggable authorization for the Roam HTTP API client.
//!
//! An [`AuthorizationStrategy`] decides whether credentials apply to an
//! outgoing request ([`AuthorizationStrategy::is_applicable`]) and how they
//! are attached ([`AuthorizationStrategy::apply_authorization`]). The
//! [`AuthorizationContext`] holds at most one active strategy and runs it
//! over every request the pipeline dispatches; strategies can be swapped at
//! runtime and take effect on the next request.
//!
//! Two strategies ship with the crate:
//!
//! - [`JwtStrategy`] — static bearer token read from the key-value store
//! - [`OAuth2Strategy`] — access/refresh token pair with expiry-driven
//!   refresh through an injected [`RefreshTokens`] implementation

mod context;
mod jwt;
mod oauth2;
mod strategy;

pub use context::AuthorizationContext;
pub use jwt::JwtStrategy;
pub use oauth2::{OAuth2Strategy, RefreshTokens, TokenRecord};
pub use strategy::AuthorizationStrategy;

pub(crate) fn is_excluded(path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| path.contains(pattern.as_str()))
}
