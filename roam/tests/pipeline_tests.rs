//! Pipeline, cache-mode and handle tests over a scripted transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use roam::{
    CacheMode, Client, ClientConfig, GetHandle, JwtStrategy, KeyValueStore, MemoryStore,
    PostHandle, RequestDescriptor, RequestOptions, SharedReachability, Transport, TransportError,
    TransportResponse,
};

/// Transport returning the same JSON body for every request, counting calls
/// and remembering the last dispatched descriptor.
#[derive(Clone)]
struct ScriptedTransport {
    status: StatusCode,
    body: String,
    calls: Arc<AtomicUsize>,
    last_request: Arc<std::sync::Mutex<Option<RequestDescriptor>>>,
}

impl ScriptedTransport {
    fn json(status: u16, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_owned(),
            calls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> Option<RequestDescriptor> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(
        &self,
        request: RequestDescriptor,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        Ok(TransportResponse {
            status: self.status,
            body: self.body.clone().into(),
        })
    }
}

/// Transport that fails before any response is received.
struct UnreachableTransport;

#[async_trait]
impl Transport for UnreachableTransport {
    async fn execute(
        &self,
        _request: RequestDescriptor,
    ) -> Result<TransportResponse, TransportError> {
        Err(TransportError::message("connection refused"))
    }
}

/// Transport answering the first call and hanging forever afterwards.
struct SucceedOnceThenHang {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Transport for SucceedOnceThenHang {
    async fn execute(
        &self,
        _request: RequestDescriptor,
    ) -> Result<TransportResponse, TransportError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Ok(TransportResponse {
                status: StatusCode::OK,
                body: USERS_BODY.into(),
            });
        }
        futures::future::pending::<()>().await;
        unreachable!()
    }
}

/// Transport that never settles, for cancellation tests.
struct HangingTransport;

#[async_trait]
impl Transport for HangingTransport {
    async fn execute(
        &self,
        _request: RequestDescriptor,
    ) -> Result<TransportResponse, TransportError> {
        futures::future::pending::<()>().await;
        unreachable!()
    }
}

fn config() -> ClientConfig {
    ClientConfig::new("https://api.example.com")
}

const USERS_BODY: &str = r#"{"data":{"name":"ada"}}"#;
const USERS_KEY: &str = "api.responses./users:{}";

async fn seed_cache(store: &MemoryStore, key: &str, body: &str) {
    store.set_raw(key, body.to_owned()).await.unwrap();
}

#[tokio::test]
async fn successful_get_populates_cache_with_full_envelope() {
    let transport = ScriptedTransport::json(200, USERS_BODY);
    let store = MemoryStore::new();
    let client = Client::new(transport.clone(), store.clone(), config());

    let envelope = client
        .get::<serde_json::Value, serde_json::Value>("/users", &[], RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(envelope.data["name"], "ada");
    assert_eq!(transport.calls(), 1);
    assert_eq!(
        store.get_raw(USERS_KEY).await.unwrap(),
        Some(USERS_BODY.to_owned())
    );
}

#[tokio::test]
async fn disabled_mode_never_writes_the_cache() {
    let transport = ScriptedTransport::json(200, USERS_BODY);
    let store = MemoryStore::new();
    let client = Client::new(transport, store.clone(), config());

    client
        .get::<serde_json::Value, serde_json::Value>(
            "/users",
            &[],
            RequestOptions::cache(CacheMode::Disabled),
        )
        .await
        .unwrap();

    assert!(store.is_empty());
}

#[tokio::test]
async fn offline_with_cache_disabled_rejects_even_when_cached() {
    let store = MemoryStore::new();
    seed_cache(&store, USERS_KEY, USERS_BODY).await;
    let transport = ScriptedTransport::json(200, USERS_BODY);
    let client = Client::new(transport.clone(), store, config())
        .with_reachability(SharedReachability::new(false));

    let error = client
        .get::<serde_json::Value, serde_json::Value>(
            "/users",
            &[],
            RequestOptions::cache(CacheMode::Disabled),
        )
        .await
        .unwrap_err();

    assert_eq!(error.code, 599);
    assert!(error.message.contains("cache was disabled"));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn offline_with_cached_entry_serves_cache_without_network() {
    let store = MemoryStore::new();
    seed_cache(&store, USERS_KEY, USERS_BODY).await;
    let transport = ScriptedTransport::json(200, r#"{"data":{"name":"fresh"}}"#);
    let client = Client::new(transport.clone(), store, config())
        .with_reachability(SharedReachability::new(false));

    let envelope = client
        .get::<serde_json::Value, serde_json::Value>("/users", &[], RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(envelope.data["name"], "ada");
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn offline_without_cached_entry_rejects_with_offline_status() {
    let transport = ScriptedTransport::json(200, USERS_BODY);
    let client = Client::new(transport, MemoryStore::new(), config())
        .with_reachability(SharedReachability::new(false));

    let error = client
        .get::<serde_json::Value, serde_json::Value>("/users", &[], RequestOptions::default())
        .await
        .unwrap_err();

    assert_eq!(error.code, 599);
    assert!(error.message.contains("not cached"));
    assert!(error.is_offline());
}

#[tokio::test]
async fn eager_hit_returns_cached_and_arms_one_background_refresh() {
    let store = MemoryStore::new();
    seed_cache(&store, USERS_KEY, USERS_BODY).await;
    let transport = ScriptedTransport::json(200, r#"{"data":{"name":"fresh"}}"#);
    let client = Client::new(transport.clone(), store.clone(), config());

    let envelope = client
        .get::<serde_json::Value, serde_json::Value>(
            "/users",
            &[],
            RequestOptions::cache(CacheMode::Eager),
        )
        .await
        .unwrap();

    // The caller sees the cached data immediately.
    assert_eq!(envelope.data["name"], "ada");

    // The background refresh settles and silently rewrites the entry.
    let refreshed = wait_for(|| async {
        store
            .get_raw(USERS_KEY)
            .await
            .unwrap()
            .filter(|raw| raw.contains("fresh"))
    })
    .await;
    assert!(refreshed.is_some(), "cache entry was not refreshed");
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn boss_hit_returns_cached_and_never_refreshes() {
    let store = MemoryStore::new();
    seed_cache(&store, USERS_KEY, USERS_BODY).await;
    let transport = ScriptedTransport::json(200, r#"{"data":{"name":"fresh"}}"#);
    let client = Client::new(transport.clone(), store.clone(), config());

    let envelope = client
        .get::<serde_json::Value, serde_json::Value>(
            "/users",
            &[],
            RequestOptions::cache(CacheMode::Boss),
        )
        .await
        .unwrap();

    assert_eq!(envelope.data["name"], "ada");
    // Give any stray task a moment to run, then confirm nothing fired.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.calls(), 0);
    assert_eq!(
        store.get_raw(USERS_KEY).await.unwrap(),
        Some(USERS_BODY.to_owned())
    );
}

#[tokio::test]
async fn eager_miss_performs_exactly_one_call_and_caches() {
    let transport = ScriptedTransport::json(200, USERS_BODY);
    let store = MemoryStore::new();
    let client = Client::new(transport.clone(), store.clone(), config());

    let envelope = client
        .get::<serde_json::Value, serde_json::Value>(
            "/users",
            &[],
            RequestOptions::cache(CacheMode::Eager),
        )
        .await
        .unwrap();

    assert_eq!(envelope.data["name"], "ada");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.calls(), 1);
    assert_eq!(
        store.get_raw(USERS_KEY).await.unwrap(),
        Some(USERS_BODY.to_owned())
    );
}

#[tokio::test]
async fn cache_key_includes_query_parameters() {
    let transport = ScriptedTransport::json(200, USERS_BODY);
    let store = MemoryStore::new();
    let client = Client::new(transport, store.clone(), config());

    client
        .get::<serde_json::Value, serde_json::Value>(
            "/users",
            &[("page", "2")],
            RequestOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        store
            .get_raw(r#"api.responses./users:{"page":"2"}"#)
            .await
            .unwrap(),
        Some(USERS_BODY.to_owned())
    );
}

#[tokio::test]
async fn cached_entry_read_back_offline_is_byte_identical() {
    let transport = ScriptedTransport::json(200, USERS_BODY);
    let store = MemoryStore::new();
    let reachability = SharedReachability::new(true);
    let client = Client::new(transport, store, config()).with_reachability(reachability.clone());

    let online = client
        .get::<serde_json::Value, serde_json::Value>("/users", &[], RequestOptions::default())
        .await
        .unwrap();

    reachability.set_connected(false);
    let offline = client
        .get::<serde_json::Value, serde_json::Value>("/users", &[], RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(online.data, offline.data);
}

#[tokio::test]
async fn server_error_payload_is_normalized_once() {
    let transport = ScriptedTransport::json(
        422,
        r#"{"message":{"message":"Validation failed","status":"error"},"errors":{"name":"is required"}}"#,
    );
    let client = Client::new(transport, MemoryStore::new(), config());

    let error = client
        .post::<serde_json::Value, serde_json::Value, _>(
            "/users",
            &serde_json::json!({}),
            RequestOptions::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(error.code, 422);
    assert_eq!(error.message, "Validation failed");
    assert_eq!(error.errors.unwrap()["name"], "is required");
}

#[tokio::test]
async fn transport_failure_maps_to_code_zero() {
    let client = Client::new(UnreachableTransport, MemoryStore::new(), config());

    let error = client
        .get::<serde_json::Value, serde_json::Value>("/users", &[], RequestOptions::default())
        .await
        .unwrap_err();

    assert_eq!(error.code, 0);
    assert!(error.message.contains("connection refused"));
}

#[tokio::test]
async fn pipeline_applies_authorization_and_content_type() {
    let transport = ScriptedTransport::json(200, USERS_BODY);
    let store = MemoryStore::new();
    let strategy = JwtStrategy::new(store.clone()).with_excluded_urls(["/auth/login"]);
    strategy.set_token("tok-1").await.unwrap();
    let client =
        Client::new(transport.clone(), store, config()).with_auth_strategy(strategy);

    client
        .get::<serde_json::Value, serde_json::Value>("/users", &[], RequestOptions::default())
        .await
        .unwrap();
    let sent = transport.last_request().unwrap();
    assert_eq!(sent.headers()[http::header::AUTHORIZATION], "Bearer tok-1");
    assert_eq!(sent.headers()[http::header::CONTENT_TYPE], "application/json");
    assert_eq!(sent.path(), "https://api.example.com/users");

    client
        .post::<serde_json::Value, serde_json::Value, _>(
            "/auth/login",
            &serde_json::json!({"user": "ada"}),
            RequestOptions::default(),
        )
        .await
        .unwrap();
    let sent = transport.last_request().unwrap();
    assert!(sent.headers().get(http::header::AUTHORIZATION).is_none());
}

#[tokio::test]
async fn get_handle_tracks_success() {
    let transport = ScriptedTransport::json(200, USERS_BODY);
    let client = Client::new(transport, MemoryStore::new(), config());
    let handle: GetHandle<serde_json::Value> = GetHandle::new(client);

    assert!(!handle.is_loading());
    let envelope = handle
        .send("/users", &[], RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(envelope.data["name"], "ada");
    assert!(!handle.is_loading());
    assert_eq!(handle.response().unwrap().data["name"], "ada");
    assert!(handle.error().is_none());
}

#[tokio::test]
async fn get_handle_tracks_failure_and_rethrows() {
    let client = Client::new(UnreachableTransport, MemoryStore::new(), config());
    let handle: GetHandle<serde_json::Value> = GetHandle::new(client);

    let result = handle.send("/users", &[], RequestOptions::default()).await;

    assert!(result.is_err());
    assert!(!handle.is_loading());
    assert!(handle.response().is_none());
    assert_eq!(handle.error().unwrap().code, 0);
}

#[tokio::test]
async fn handle_reset_restores_initial_state() {
    let transport = ScriptedTransport::json(200, USERS_BODY);
    let client = Client::new(transport, MemoryStore::new(), config());
    let handle: GetHandle<serde_json::Value> = GetHandle::new(client);

    handle
        .send("/users", &[], RequestOptions::default())
        .await
        .unwrap();
    handle.reset();

    let state = handle.state();
    assert!(state.response.is_none());
    assert!(state.error.is_none());
    assert!(!state.is_loading);
}

#[tokio::test]
async fn cancel_settles_with_cancellation_error() {
    let client = Client::new(HangingTransport, MemoryStore::new(), config());
    let handle: Arc<GetHandle<serde_json::Value>> = Arc::new(GetHandle::new(client));

    let task = {
        let handle = handle.clone();
        tokio::spawn(async move {
            handle
                .send(
                    "/users",
                    &[],
                    RequestOptions::cache(CacheMode::Disabled),
                )
                .await
        })
    };

    // Let the request reach the transport before cancelling.
    wait_for(|| async { handle.is_loading().then_some(()) })
        .await
        .expect("request never started");
    handle.cancel();

    let result = task.await.unwrap();
    let error = result.unwrap_err();
    assert!(error.is_cancelled());
    assert!(!handle.is_loading());
    assert!(handle.response().is_none());
    assert!(handle.error().unwrap().is_cancelled());
}

#[tokio::test]
async fn cancel_keeps_prior_response() {
    // Succeeds once, then hangs, so the second call can be cancelled while
    // the handle still carries the first response.
    let transport = SucceedOnceThenHang {
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let client = Client::new(transport, MemoryStore::new(), config());
    let handle: Arc<GetHandle<serde_json::Value>> = Arc::new(GetHandle::new(client));

    handle
        .send("/users", &[], RequestOptions::cache(CacheMode::Disabled))
        .await
        .unwrap();
    assert_eq!(handle.response().unwrap().data["name"], "ada");

    let task = {
        let handle = handle.clone();
        tokio::spawn(async move {
            handle
                .send("/users", &[], RequestOptions::cache(CacheMode::Disabled))
                .await
        })
    };
    wait_for(|| async { handle.is_loading().then_some(()) })
        .await
        .expect("second request never started");
    handle.cancel();

    let error = task.await.unwrap().unwrap_err();
    assert!(error.is_cancelled());
    assert_eq!(handle.response().unwrap().data["name"], "ada");
    assert!(handle.error().unwrap().is_cancelled());
}

#[tokio::test]
async fn post_handle_tracks_lifecycle() {
    let transport = ScriptedTransport::json(201, r#"{"data":{"id":7}}"#);
    let client = Client::new(transport, MemoryStore::new(), config());
    let handle: PostHandle<serde_json::Value> = PostHandle::new(client);

    let envelope = handle
        .send(
            "/users",
            &serde_json::json!({"name": "ada"}),
            RequestOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(envelope.data["id"], 7);
    assert_eq!(handle.response().unwrap().data["id"], 7);
    assert!(!handle.is_loading());
}

/// Polls `probe` until it yields `Some`, or panics after a short deadline.
async fn wait_for<F, Fut, T>(probe: F) -> Option<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Option<T>>,
{
    for _ in 0..100 {
        if let Some(value) = probe().await {
            return Some(value);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}
