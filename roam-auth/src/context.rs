//! The authorization context.

use std::sync::{Arc, PoisonError, RwLock};

use roam_core::RequestDescriptor;

use crate::AuthorizationStrategy;

/// Holds the active authorization strategy and applies it to requests.
///
/// At most one strategy is active at a time. [`set_strategy`] swaps it at
/// runtime and takes effect on the next request; requests already in flight
/// keep the descriptor the previous strategy produced.
///
/// [`set_strategy`]: AuthorizationContext::set_strategy
#[derive(Clone, Default)]
pub struct AuthorizationContext {
    strategy: Arc<RwLock<Option<Arc<dyn AuthorizationStrategy>>>>,
}

impl AuthorizationContext {
    /// Creates a context with no active strategy; requests pass through
    /// unchanged until one is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context with the given strategy active.
    pub fn with_strategy(strategy: impl AuthorizationStrategy + 'static) -> Self {
        let context = Self::new();
        context.set_strategy(strategy);
        context
    }

    /// Replaces the active strategy.
    pub fn set_strategy(&self, strategy: impl AuthorizationStrategy + 'static) {
        *self
            .strategy
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(strategy));
    }

    /// Removes the active strategy.
    pub fn clear_strategy(&self) {
        *self
            .strategy
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns the active strategy, if any.
    pub fn strategy(&self) -> Option<Arc<dyn AuthorizationStrategy>> {
        self.strategy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs the active strategy over the request when it is applicable,
    /// otherwise passes the request through unchanged.
    pub async fn apply_strategies(&self, request: RequestDescriptor) -> RequestDescriptor {
        match self.strategy() {
            Some(strategy) if strategy.is_applicable(&request) => {
                strategy.apply_authorization(request).await
            }
            _ => request,
        }
    }
}

impl std::fmt::Debug for AuthorizationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationContext")
            .field("active", &self.strategy().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use http::HeaderValue;

    use super::*;

    struct StaticHeader(&'static str);

    #[async_trait]
    impl AuthorizationStrategy for StaticHeader {
        fn is_applicable(&self, request: &RequestDescriptor) -> bool {
            !request.path().contains("/public")
        }

        async fn apply_authorization(&self, request: RequestDescriptor) -> RequestDescriptor {
            request.with_authorization(HeaderValue::from_static(self.0))
        }
    }

    #[tokio::test]
    async fn empty_context_passes_requests_through() {
        let context = AuthorizationContext::new();
        let request = RequestDescriptor::get("/users");
        let applied = context.apply_strategies(request).await;
        assert!(applied.headers().get(http::header::AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn applicable_strategy_attaches_credentials() {
        let context = AuthorizationContext::with_strategy(StaticHeader("Bearer t1"));
        let applied = context
            .apply_strategies(RequestDescriptor::get("/users"))
            .await;
        assert_eq!(
            applied.headers()[http::header::AUTHORIZATION],
            HeaderValue::from_static("Bearer t1")
        );
    }

    #[tokio::test]
    async fn inapplicable_strategy_is_skipped() {
        let context = AuthorizationContext::with_strategy(StaticHeader("Bearer t1"));
        let applied = context
            .apply_strategies(RequestDescriptor::get("/public/ping"))
            .await;
        assert!(applied.headers().get(http::header::AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn swapping_takes_effect_on_next_request() {
        let context = AuthorizationContext::with_strategy(StaticHeader("Bearer t1"));
        context.set_strategy(StaticHeader("Bearer t2"));
        let applied = context
            .apply_strategies(RequestDescriptor::get("/users"))
            .await;
        assert_eq!(
            applied.headers()[http::header::AUTHORIZATION],
            HeaderValue::from_static("Bearer t2")
        );
    }
}
