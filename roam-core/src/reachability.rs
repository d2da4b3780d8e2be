//! Network reachability sensing.
//!
//! The cache-aware GET path consults a [`Reachability`] signal before every
//! request to choose between the online and offline branches. Platform
//! bindings implement the trait over whatever connectivity API the host
//! exposes; tests and simple deployments use the provided implementations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

/// Point-in-time indication of network connectivity.
#[async_trait]
pub trait Reachability: Send + Sync {
    /// Returns `Some(true)` when connected, `Some(false)` when not, and
    /// `None` when connectivity is unknown (treated as connected by
    /// consumers).
    async fn is_connected(&self) -> Option<bool>;
}

#[async_trait]
impl<R> Reachability for Arc<R>
where
    R: Reachability + ?Sized,
{
    async fn is_connected(&self) -> Option<bool> {
        (**self).is_connected().await
    }
}

/// Reachability signal that always reports a connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

#[async_trait]
impl Reachability for AlwaysOnline {
    async fn is_connected(&self) -> Option<bool> {
        Some(true)
    }
}

/// Shared, flippable reachability switch.
///
/// Clones observe the same underlying flag, so a platform binding (or a
/// test) can hold one clone and flip connectivity for a client holding
/// another.
///
/// ```
/// use roam_core::SharedReachability;
///
/// let switch = SharedReachability::new(true);
/// let observer = switch.clone();
/// switch.set_connected(false);
/// ```
#[derive(Debug, Clone)]
pub struct SharedReachability {
    connected: Arc<AtomicBool>,
}

impl SharedReachability {
    /// Creates a switch with the given initial state.
    pub fn new(connected: bool) -> Self {
        Self {
            connected: Arc::new(AtomicBool::new(connected)),
        }
    }

    /// Flips the connectivity flag for every clone.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl Default for SharedReachability {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Reachability for SharedReachability {
    async fn is_connected(&self) -> Option<bool> {
        Some(self.connected.load(Ordering::SeqCst))
    }
}
