//! OAuth2 access/refresh token strategy.

use std::sync::Arc;

use async_trait::async_trait;
use http::header::HeaderValue;
use roam_core::{ApiError, RequestDescriptor};
use roam_store::{KeyValueStore, KeyValueStoreExt, StoreResult};
use serde::{Deserialize, Serialize};

use crate::AuthorizationStrategy;

const DEFAULT_STORAGE_KEY: &str = "auth.oauth2";
const DEFAULT_REFRESH_TOKEN_URL: &str = "/oauth/token";

/// Safety margin subtracted from the expiry timestamp so a token is
/// refreshed before it actually lapses mid-request.
const EXPIRY_SKEW_MS: i64 = 30_000;

/// Persisted OAuth2 token pair.
///
/// Serialized to the key-value store in camelCase, so records written by
/// other bindings of the same backend round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// Access token attached to outgoing requests.
    pub access_token: String,
    /// Token used to obtain a new access token, if the server issued one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry of the access token in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Authorization scheme, defaults to `Bearer` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl TokenRecord {
    /// Creates a record holding only an access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            token_type: None,
        }
    }

    /// Authorization scheme for the `Authorization` header.
    pub fn token_type(&self) -> &str {
        self.token_type.as_deref().unwrap_or("Bearer")
    }

    /// True when the access token is past its expiry minus the skew
    /// buffer. Records without an expiry never report expired.
    pub fn is_expired(&self, now_millis: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => now_millis > expires_at - EXPIRY_SKEW_MS,
            None => false,
        }
    }
}

/// The network half of a token refresh.
///
/// Injected into [`OAuth2Strategy`] so the strategy itself stays
/// transport-free: implementations typically POST the refresh token to the
/// refresh endpoint and map the response into a new [`TokenRecord`].
#[async_trait]
pub trait RefreshTokens: Send + Sync {
    /// Exchanges the current record for a fresh one.
    async fn refresh(&self, current: &TokenRecord) -> Result<TokenRecord, ApiError>;
}

#[async_trait]
impl<R> RefreshTokens for Arc<R>
where
    R: RefreshTokens + ?Sized,
{
    async fn refresh(&self, current: &TokenRecord) -> Result<TokenRecord, ApiError> {
        (**self).refresh(current).await
    }
}

/// Callback invoked after a successful token refresh.
pub type OnTokenRefresh = Arc<dyn Fn(&TokenRecord) + Send + Sync>;

/// OAuth2 strategy with expiry-driven refresh.
///
/// On every applicable request the strategy reads the stored
/// [`TokenRecord`]. An expired record with a refresh token triggers one
/// refresh attempt through the injected [`RefreshTokens`] implementation;
/// a refresh failure is logged and swallowed so the original request still
/// proceeds (and is expected to surface a 401 upstream). Requests to the
/// refresh endpoint itself never trigger a refresh.
pub struct OAuth2Strategy<S> {
    store: S,
    storage_key: String,
    refresh_token_url: String,
    excluded_urls: Vec<String>,
    refresher: Option<Arc<dyn RefreshTokens>>,
    on_token_refresh: Option<OnTokenRefresh>,
}

impl<S> OAuth2Strategy<S>
where
    S: KeyValueStore,
{
    /// Creates a strategy with the default storage key (`auth.oauth2`) and
    /// refresh endpoint (`/oauth/token`), no exclusions and no refresher.
    pub fn new(store: S) -> Self {
        Self {
            store,
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
            refresh_token_url: DEFAULT_REFRESH_TOKEN_URL.to_owned(),
            excluded_urls: Vec::new(),
            refresher: None,
            on_token_refresh: None,
        }
    }

    /// Overrides the storage key the token record is persisted under.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Overrides the refresh endpoint URL used by the recursion guard.
    pub fn with_refresh_token_url(mut self, url: impl Into<String>) -> Self {
        self.refresh_token_url = url.into();
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

    /// Injects the refresh transport.
    pub fn with_refresher(mut self, refresher: impl RefreshTokens + 'static) -> Self {
        self.refresher = Some(Arc::new(refresher));
        self
    }

    /// Registers a callback invoked after every successful refresh.
    pub fn on_token_refresh(mut self, callback: impl Fn(&TokenRecord) + Send + Sync + 'static) -> Self {
        self.on_token_refresh = Some(Arc::new(callback));
        self
    }

    /// Persists a token record as a full overwrite.
    pub async fn set_tokens(&self, tokens: &TokenRecord) -> StoreResult<()> {
        self.store.set_json(&self.storage_key, tokens).await
    }

    /// Reads the current token record, if any.
    pub async fn get_tokens(&self) -> StoreResult<Option<TokenRecord>> {
        self.store.get_json(&self.storage_key).await
    }

    /// Removes the token record.
    pub async fn clear_tokens(&self) -> StoreResult<()> {
        self.store.remove(&self.storage_key).await
    }

    async fn read_tokens_or_none(&self) -> Option<TokenRecord> {
        match self.get_tokens().await {
            Ok(tokens) => tokens,
            Err(error) => {
                tracing::warn!(target: "roam::auth", %error, "token record read failed");
                None
            }
        }
    }

    async fn try_refresh(&self, current: &TokenRecord) {
        let Some(refresher) = &self.refresher else {
            tracing::warn!(
                target: "roam::auth",
                "access token expired but no refresher is configured",
            );
            return;
        };
        match refresher.refresh(current).await {
            Ok(refreshed) => {
                if let Err(error) = self.set_tokens(&refreshed).await {
                    tracing::warn!(target: "roam::auth", %error, "failed to persist refreshed tokens");
                    return;
                }
                if let Some(callback) = &self.on_token_refresh {
                    callback(&refreshed);
                }
            }
            Err(error) => {
                // The original request proceeds with possibly-stale
                // credentials and surfaces a 401 upstream.
                tracing::warn!(target: "roam::auth", %error, "token refresh failed");
            }
        }
    }
}

#[async_trait]
impl<S> AuthorizationStrategy for OAuth2Strategy<S>
where
    S: KeyValueStore,
{
    fn is_applicable(&self, request: &RequestDescriptor) -> bool {
        !crate::is_excluded(request.path(), &self.excluded_urls)
    }

    async fn apply_authorization(&self, request: RequestDescriptor) -> RequestDescriptor {
        let Some(tokens) = self.read_tokens_or_none().await else {
            return request;
        };

        let now = chrono::Utc::now().timestamp_millis();
        if tokens.is_expired(now) && tokens.refresh_token.is_some() {
            // The refresh endpoint must never trigger a self-refresh.
            if request.path() == self.refresh_token_url {
                return request;
            }
            self.try_refresh(&tokens).await;
        }

        // Re-read: the record may have been rewritten by the refresh.
        let Some(current) = self.read_tokens_or_none().await else {
            return request;
        };
        if current.access_token.is_empty() {
            return request;
        }
        let header = format!("{} {}", current.token_type(), current.access_token);
        match HeaderValue::from_str(&header) {
            Ok(value) => request.with_authorization(value),
            Err(error) => {
                tracing::warn!(target: "roam::auth", %error, "stored access token is not a valid header value");
                request
            }
        }
    }
}
