//! The client: request pipeline and cache-aware GET.

use std::sync::Arc;

use roam_auth::{AuthorizationContext, AuthorizationStrategy};
use roam_core::{ApiError, CacheKey, Envelope, Reachability, RequestDescriptor, query_json};
use roam_store::KeyValueStore;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{ClientConfig, RequestOptions};
use crate::transport::{Transport, TransportResponse};

/// Explicitly constructed, dependency-injected API client.
///
/// Owns its transport, store, reachability signal and authorization
/// context — nothing is process-global, so isolated clients can coexist
/// (and be instantiated per test). Cloning is cheap; clones share the same
/// collaborators.
///
/// # Example
///
/// ```no_run
/// use roam::{Client, ClientConfig, MemoryStore};
/// # use roam::{Transport, TransportError, TransportResponse, RequestDescriptor};
/// # struct SomeTransport;
/// # #[async_trait::async_trait]
/// # impl Transport for SomeTransport {
/// #     async fn execute(&self, _: RequestDescriptor) -> Result<TransportResponse, TransportError> {
/// #         unimplemented!()
/// #     }
/// # }
///
/// let client = Client::new(
///     SomeTransport,
///     MemoryStore::new(),
///     ClientConfig::new("https://api.example.com"),
/// );
/// ```
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    store: Arc<dyn KeyValueStore>,
    reachability: Arc<dyn Reachability>,
    auth: AuthorizationContext,
    config: Arc<ClientConfig>,
}

impl Client {
    /// Creates a client over the given transport and store.
    ///
    /// Reachability defaults to always-online and no authorization
    /// strategy is active.
    pub fn new(
        transport: impl Transport + 'static,
        store: impl KeyValueStore + 'static,
        config: ClientConfig,
    ) -> Self {
        Self {
            transport: Arc::new(transport),
            store: Arc::new(store),
            reachability: Arc::new(roam_core::AlwaysOnline),
            auth: AuthorizationContext::new(),
            config: Arc::new(config),
        }
    }

    /// Replaces the reachability signal.
    pub fn with_reachability(mut self, reachability: impl Reachability + 'static) -> Self {
        self.reachability = Arc::new(reachability);
        self
    }

    /// Activates an authorization strategy.
    pub fn with_auth_strategy(self, strategy: impl AuthorizationStrategy + 'static) -> Self {
        self.auth.set_strategy(strategy);
        self
    }

    /// The authorization context, for runtime strategy swaps.
    pub fn auth(&self) -> &AuthorizationContext {
        &self.auth
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Cache-aware GET.
    ///
    /// The cache mode comes from `options.cache`, then the reserved `cache`
    /// query key, then the default ([`CacheMode::Offline`]). Offline
    /// behavior and the online cache-hit short-circuit follow the mode; see
    /// [`CacheMode`] for the four policies.
    ///
    /// [`CacheMode`]: roam_core::CacheMode
    /// [`CacheMode::Offline`]: roam_core::CacheMode::Offline
    pub async fn get<T, M>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        options: RequestOptions,
    ) -> Result<Envelope<T, M>, ApiError>
    where
        T: DeserializeOwned,
        M: DeserializeOwned,
    {
        let mut request = RequestDescriptor::get(path).with_query(query.iter().copied());
        for (name, value) in options.headers.iter() {
            request = request.with_header(name.clone(), value.clone());
        }
        if let Some(mode) = options.cache {
            request = request.with_cache_mode(mode);
        }

        let mode = request.cache_mode();
        let params = query_json(request.query());
        let storage_key =
            CacheKey::for_request(path, request.query()).namespaced(&self.config.cache_prefix);

        let connected = self.reachability.is_connected().await.unwrap_or(true);
        if !connected {
            if !mode.is_enabled() {
                return Err(ApiError::offline_cache_disabled(path, &params));
            }
            return match self.read_cache(&storage_key).await {
                Some(envelope) => Ok(envelope),
                None => Err(ApiError::offline_not_cached(path, &params)),
            };
        }

        if mode.serves_hit_while_online() {
            if let Some(envelope) = self.read_cache(&storage_key).await {
                if mode.arms_background_refresh() {
                    self.spawn_background_refresh(request, storage_key);
                }
                return Ok(envelope);
            }
        }

        let response = self.dispatch(request).await?;
        if mode.is_enabled() {
            self.write_cache(&storage_key, &response).await;
        }
        decode(&response)
    }

    /// POST with a JSON body. Never cached.
    pub async fn post<T, M, B>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Envelope<T, M>, ApiError>
    where
        T: DeserializeOwned,
        M: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.write_request(RequestDescriptor::post(path), body, options)?;
        self.send(request).await
    }

    /// PUT with a JSON body. Never cached.
    pub async fn put<T, M, B>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Envelope<T, M>, ApiError>
    where
        T: DeserializeOwned,
        M: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.write_request(RequestDescriptor::put(path), body, options)?;
        self.send(request).await
    }

    /// DELETE with query parameters. Never cached.
    pub async fn delete<T, M>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        options: RequestOptions,
    ) -> Result<Envelope<T, M>, ApiError>
    where
        T: DeserializeOwned,
        M: DeserializeOwned,
    {
        let mut request = RequestDescriptor::delete(path).with_query(query.iter().copied());
        for (name, value) in options.headers.iter() {
            request = request.with_header(name.clone(), value.clone());
        }
        self.send(request).await
    }

    /// Dispatches an arbitrary descriptor and decodes the envelope.
    ///
    /// The entry point for callers that build descriptors themselves, e.g.
    /// multipart uploads. No caching is applied.
    pub async fn send<T, M>(&self, request: RequestDescriptor) -> Result<Envelope<T, M>, ApiError>
    where
        T: DeserializeOwned,
        M: DeserializeOwned,
    {
        let response = self.dispatch(request).await?;
        decode(&response)
    }

    /// Runs the pipeline stages over a descriptor and executes it.
    ///
    /// Stages, in order: default content type, authorization, base URL
    /// resolution, transport execution. Every failure is normalized into an
    /// [`ApiError`] here and nowhere else.
    async fn dispatch(&self, request: RequestDescriptor) -> Result<TransportResponse, ApiError> {
        let request = request.with_default_content_type();
        let request = self.auth.apply_strategies(request).await;
        tracing::debug!(
            target: "roam::api",
            method = %request.method(),
            path = request.path(),
            query = ?request.query(),
            "dispatching request",
        );
        let resolved = self.config.resolve(request.path());
        let request = request.with_path(resolved);

        match self.transport.execute(request).await {
            Ok(response) if response.status.is_success() => {
                tracing::debug!(
                    target: "roam::api",
                    status = response.status.as_u16(),
                    bytes = response.body.len(),
                    "request settled",
                );
                Ok(response)
            }
            Ok(response) => Err(ApiError::from_response(
                response.status.as_u16(),
                &response.body,
            )),
            Err(error) => Err(ApiError::no_response(error)),
        }
    }

    async fn read_cache<T, M>(&self, storage_key: &str) -> Option<Envelope<T, M>>
    where
        T: DeserializeOwned,
        M: DeserializeOwned,
    {
        let raw = match self.store.get_raw(storage_key).await {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!(target: "roam::cache", storage_key, %error, "cache read failed");
                return None;
            }
        };
        match Envelope::from_json(raw.as_bytes()) {
            Ok(envelope) => Some(envelope),
            Err(error) => {
                // Corrupt entries degrade to a miss.
                tracing::warn!(target: "roam::cache", storage_key, %error, "cached entry is not decodable");
                None
            }
        }
    }

    /// Stores the full response envelope. Failures are logged, never
    /// surfaced: the caller already has its data.
    async fn write_cache(&self, storage_key: &str, response: &TransportResponse) {
        let raw = String::from_utf8_lossy(&response.body).into_owned();
        if let Err(error) = self.store.set_raw(storage_key, raw).await {
            tracing::warn!(target: "roam::cache", storage_key, %error, "cache write failed");
        }
    }

    /// Fire-and-forget refresh for eager-mode cache hits: re-dispatches the
    /// request and silently rewrites the cache entry, ignoring the result.
    fn spawn_background_refresh(&self, request: RequestDescriptor, storage_key: String) {
        let client = self.clone();
        tokio::spawn(async move {
            match client.dispatch(request).await {
                Ok(response) => client.write_cache(&storage_key, &response).await,
                Err(error) => {
                    tracing::debug!(target: "roam::cache", storage_key, %error, "background refresh failed");
                }
            }
        });
    }

    fn write_request<B>(
        &self,
        request: RequestDescriptor,
        body: &B,
        options: RequestOptions,
    ) -> Result<RequestDescriptor, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let value = serde_json::to_value(body).map_err(|error| {
            ApiError::new(
                0,
                Some(format!("The request body could not be serialized: {error}")),
                None,
            )
        })?;
        let mut request = request.with_json(value);
        for (name, value) in options.headers.iter() {
            request = request.with_header(name.clone(), value.clone());
        }
        Ok(request)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("auth", &self.auth)
            .finish()
    }
}

fn decode<T, M>(response: &TransportResponse) -> Result<Envelope<T, M>, ApiError>
where
    T: DeserializeOwned,
    M: DeserializeOwned,
{
    Envelope::from_json(&response.body).map_err(|error| {
        ApiError::new(
            response.status.as_u16(),
            Some(format!("The response body could not be decoded: {error}")),
            None,
        )
    })
}
