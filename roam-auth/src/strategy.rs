//! The authorization strategy contract.

use std::sync::Arc;

use async_trait::async_trait;
use roam_core::RequestDescriptor;

/// Policy deciding whether and how credentials attach to a request.
///
/// `apply_authorization` consumes the descriptor and returns a new one with
/// credential headers attached, or the original descriptor unchanged when
/// no credential is available — a missing credential is not an error at
/// this layer; the request proceeds unauthenticated.
#[async_trait]
pub trait AuthorizationStrategy: Send + Sync {
    /// True when this strategy should run for the given request.
    ///
    /// Must return false for any request whose URL matches a configured
    /// exclusion pattern.
    fn is_applicable(&self, request: &RequestDescriptor) -> bool;

    /// Attaches credentials to the request.
    async fn apply_authorization(&self, request: RequestDescriptor) -> RequestDescriptor;
}

#[async_trait]
impl<S> AuthorizationStrategy for Arc<S>
where
    S: AuthorizationStrategy + ?Sized,
{
    fn is_applicable(&self, request: &RequestDescriptor) -> bool {
        (**self).is_applicable(request)
    }

    async fn apply_authorization(&self, request: RequestDescriptor) -> RequestDescriptor {
        (**self).apply_authorization(request).await
    }
}
