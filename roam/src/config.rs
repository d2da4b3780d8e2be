//! Client configuration and per-request options.

use http::HeaderMap;
use roam_core::CacheMode;

/// Environment variable read by [`ClientConfig::from_env`].
pub const BASE_URL_ENV: &str = "ROAM_BASE_URL";

const DEFAULT_CACHE_PREFIX: &str = "api.responses.";

/// Static configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL prefixed to every relative request path.
    pub base_url: String,
    /// Storage namespace for cached GET responses.
    pub cache_prefix: String,
}

impl ClientConfig {
    /// Creates a configuration for the given base URL with the default
    /// cache namespace.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cache_prefix: DEFAULT_CACHE_PREFIX.to_owned(),
        }
    }

    /// Reads the base URL from the `ROAM_BASE_URL` environment variable.
    pub fn from_env() -> Option<Self> {
        std::env::var(BASE_URL_ENV).ok().map(Self::new)
    }

    /// Overrides the cache storage namespace.
    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    /// Resolves a request path against the base URL.
    ///
    /// Absolute URLs pass through untouched so callers can still target
    /// other hosts explicitly.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Per-request options accepted by the client and the request-state
/// handles.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Cache mode override; falls back to the reserved `cache` query key,
    /// then to the default mode.
    pub cache: Option<CacheMode>,
    /// Extra headers merged into the request.
    pub headers: HeaderMap,
}

impl RequestOptions {
    /// Options selecting a cache mode.
    pub fn cache(mode: CacheMode) -> Self {
        Self {
            cache: Some(mode),
            ..Self::default()
        }
    }
}
