//! Per-call-site request state tracking.
//!
//! A handle wraps one [`Client`] verb and tracks the
//! loading/response/error triple for its call site, mirroring what a UI
//! binding needs to render a request's lifecycle. Each handle tracks at
//! most one outstanding request: issuing a second call before the first
//! settles overwrites the tracked state (and, for GET, the cancellation
//! handle), so sequencing superseded calls is the caller's concern.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{AbortHandle, Abortable};
use roam_core::{ApiError, Envelope};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::client::Client;
use crate::config::RequestOptions;

/// Snapshot of a handle's request lifecycle.
///
/// `is_loading` is true for the entire span between request start and
/// settlement and false otherwise. After settlement the outcome lives in
/// `response` (success) or `error` (failure); an error never clears the
/// previous `response`.
#[derive(Debug, Clone)]
pub struct RequestState<T, M = serde_json::Value> {
    /// Last successful envelope, if any.
    pub response: Option<Envelope<T, M>>,
    /// True while a request is in flight.
    pub is_loading: bool,
    /// Error from the last settled request, if it failed.
    pub error: Option<ApiError>,
}

impl<T, M> Default for RequestState<T, M> {
    fn default() -> Self {
        Self {
            response: None,
            is_loading: false,
            error: None,
        }
    }
}

/// Shared state cell; handles clone it into their futures.
struct StateCell<T, M> {
    state: Mutex<RequestState<T, M>>,
}

impl<T, M> Default for StateCell<T, M> {
    fn default() -> Self {
        Self {
            state: Mutex::new(RequestState::default()),
        }
    }
}

impl<T, M> StateCell<T, M>
where
    T: Clone,
    M: Clone,
{
    fn lock(&self) -> std::sync::MutexGuard<'_, RequestState<T, M>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the request started: loading set, prior error cleared.
    fn start(&self) {
        let mut state = self.lock();
        state.is_loading = true;
        state.error = None;
    }

    /// Records the settled outcome and clears the loading flag.
    fn settle(&self, outcome: &Result<Envelope<T, M>, ApiError>) {
        let mut state = self.lock();
        match outcome {
            Ok(envelope) => state.response = Some(envelope.clone()),
            Err(error) => state.error = Some(error.clone()),
        }
        state.is_loading = false;
    }

    fn reset(&self) {
        *self.lock() = RequestState::default();
    }

    fn snapshot(&self) -> RequestState<T, M> {
        self.lock().clone()
    }
}

macro_rules! state_accessors {
    () => {
        /// Snapshot of the current request state.
        pub fn state(&self) -> RequestState<T, M> {
            self.cell.snapshot()
        }

        /// Last successful envelope, if any.
        pub fn response(&self) -> Option<Envelope<T, M>> {
            self.cell.snapshot().response
        }

        /// True while a request is in flight.
        pub fn is_loading(&self) -> bool {
            self.cell.snapshot().is_loading
        }

        /// Error from the last settled request, if it failed.
        pub fn error(&self) -> Option<ApiError> {
            self.cell.snapshot().error
        }

        /// Clears response, loading flag and error without affecting any
        /// in-flight call.
        pub fn reset(&self) {
            self.cell.reset();
        }
    };
}

/// Request-state handle for cache-aware GET calls.
///
/// The only handle supporting [`cancel`](GetHandle::cancel): aborting the
/// in-flight call settles it with a cancellation-flavored [`ApiError`]
/// (recognizable via [`ApiError::is_cancelled`]) while `response` keeps its
/// prior value.
pub struct GetHandle<T, M = serde_json::Value> {
    client: Client,
    cell: Arc<StateCell<T, M>>,
    abort: Mutex<Option<AbortHandle>>,
}

impl<T, M> GetHandle<T, M>
where
    T: DeserializeOwned + Clone,
    M: DeserializeOwned + Clone,
{
    /// Creates a handle over the client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cell: Arc::new(StateCell::default()),
            abort: Mutex::new(None),
        }
    }

    /// Performs a GET, tracking its lifecycle in the handle state.
    ///
    /// Errors are stored *and* returned; callers must handle the `Err`
    /// themselves, nothing is swallowed.
    pub async fn send(
        &self,
        path: &str,
        query: &[(&str, &str)],
        options: RequestOptions,
    ) -> Result<Envelope<T, M>, ApiError> {
        self.cell.start();

        let (abort_handle, registration) = AbortHandle::new_pair();
        *self.abort.lock().unwrap_or_else(PoisonError::into_inner) = Some(abort_handle);

        let call = Abortable::new(self.client.get::<T, M>(path, query, options), registration);
        let outcome = match call.await {
            Ok(result) => result,
            Err(_aborted) => Err(ApiError::cancelled()),
        };

        self.cell.settle(&outcome);
        outcome
    }

    /// Aborts the in-flight call, if any.
    ///
    /// The pending [`send`](GetHandle::send) settles with a cancellation
    /// error. Cooperative: a cache write that already completed is not
    /// undone.
    pub fn cancel(&self) {
        if let Some(handle) = self
            .abort
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            handle.abort();
        }
    }

    state_accessors!();
}

/// Request-state handle for POST calls.
pub struct PostHandle<T, M = serde_json::Value> {
    client: Client,
    cell: Arc<StateCell<T, M>>,
}

impl<T, M> PostHandle<T, M>
where
    T: DeserializeOwned + Clone,
    M: DeserializeOwned + Clone,
{
    /// Creates a handle over the client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cell: Arc::new(StateCell::default()),
        }
    }

    /// Performs a POST, tracking its lifecycle in the handle state.
    pub async fn send<B>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Envelope<T, M>, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.cell.start();
        let outcome = self.client.post::<T, M, B>(path, body, options).await;
        self.cell.settle(&outcome);
        outcome
    }

    state_accessors!();
}

/// Request-state handle for PUT calls.
pub struct PutHandle<T, M = serde_json::Value> {
    client: Client,
    cell: Arc<StateCell<T, M>>,
}

impl<T, M> PutHandle<T, M>
where
    T: DeserializeOwned + Clone,
    M: DeserializeOwned + Clone,
{
    /// Creates a handle over the client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cell: Arc::new(StateCell::default()),
        }
    }

    /// Performs a PUT, tracking its lifecycle in the handle state.
    pub async fn send<B>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Envelope<T, M>, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.cell.start();
        let outcome = self.client.put::<T, M, B>(path, body, options).await;
        self.cell.settle(&outcome);
        outcome
    }

    state_accessors!();
}

/// Request-state handle for DELETE calls.
pub struct DeleteHandle<T, M = serde_json::Value> {
    client: Client,
    cell: Arc<StateCell<T, M>>,
}

impl<T, M> DeleteHandle<T, M>
where
    T: DeserializeOwned + Clone,
    M: DeserializeOwned + Clone,
{
    /// Creates a handle over the client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cell: Arc::new(StateCell::default()),
        }
    }

    /// Performs a DELETE, tracking its lifecycle in the handle state.
    pub async fn send(
        &self,
        path: &str,
        query: &[(&str, &str)],
        options: RequestOptions,
    ) -> Result<Envelope<T, M>, ApiError> {
        self.cell.start();
        let outcome = self.client.delete::<T, M>(path, query, options).await;
        self.cell.settle(&outcome);
        outcome
    }

    state_accessors!();
}
