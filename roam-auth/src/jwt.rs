//! Static bearer token strategy.

use async_trait::async_trait;
use http::header::HeaderValue;
use roam_core::RequestDescriptor;
use roam_store::{KeyValueStore, KeyValueStoreExt, StoreResult};

use crate::AuthorizationStrategy;

const DEFAULT_TOKEN_KEY: &str = "auth.token";

/// Bearer token strategy backed by the key-value store.
///
/// Reads a single token string from the store on every request and, when
/// present, attaches `Authorization: Bearer <token>`. A missing token
/// leaves the request unauthenticated. The token can be managed
/// out-of-band with [`set_token`], [`get_token`] and [`clear_token`].
///
/// [`set_token`]: JwtStrategy::set_token
/// [`get_token`]: JwtStrategy::get_token
/// [`clear_token`]: JwtStrategy::clear_token
#[derive(Debug, Clone)]
pub struct JwtStrategy<S> {
    store: S,
    token_key: String,
    excluded_urls: Vec<String>,
}

impl<S> JwtStrategy<S>
where
    S: KeyValueStore,
{
    /// Creates a strategy reading the token under the default key
    /// (`auth.token`) with no exclusions.
    pub fn new(store: S) -> Self {
        Self {
            store,
            token_key: DEFAULT_TOKEN_KEY.to_owned(),
            excluded_urls: Vec::new(),
        }
    }

    /// Overrides the storage key the token is read from.
    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    /// URL patterns this strategy never applies to (substring match).
    pub fn with_excluded_urls<I, P>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.excluded_urls = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Stores the token.
    pub async fn set_token(&self, token: &str) -> StoreResult<()> {
        self.store.set_json(&self.token_key, &token).await
    }

    /// Reads the current token, if any.
    pub async fn get_token(&self) -> StoreResult<Option<String>> {
        self.store.get_json(&self.token_key).await
    }

    /// Removes the token.
    pub async fn clear_token(&self) -> StoreResult<()> {
        self.store.remove(&self.token_key).await
    }
}

#[async_trait]
impl<S> AuthorizationStrategy for JwtStrategy<S>
where
    S: KeyValueStore,
{
    fn is_applicable(&self, request: &RequestDescriptor) -> bool {
        !crate::is_excluded(request.path(), &self.excluded_urls)
    }

    async fn apply_authorization(&self, request: RequestDescriptor) -> RequestDescriptor {
        let token = match self.get_token().await {
            Ok(token) => token,
            Err(error) => {
                tracing::warn!(target: "roam::auth", %error, "token read failed, proceeding unauthenticated");
                None
            }
        };
        let Some(token) = token else {
            return request;
        };
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(value) => request.with_authorization(value),
            Err(error) => {
                tracing::warn!(target: "roam::auth", %error, "stored token is not a valid header value");
                request
            }
        }
    }
}
