//! Cache mode selection and cache key construction.
//!
//! - [`CacheMode`] - Per-request policy controlling whether/when a GET
//!   consults or populates the local response cache
//! - [`CacheKey`] - Deterministic key derived from the request path and its
//!   query parameters
//!
//! ## Key format
//!
//! Keys serialize as `{path}:{params}` where `params` is the query pair
//! list rendered as a JSON object in insertion order (the crate enables
//! serde_json's `preserve_order` so the rendering is deterministic):
//!
//! ```
//! use roam_core::CacheKey;
//!
//! let key = CacheKey::for_request("/users", &[("page".into(), "2".into())]);
//! assert_eq!(format!("{}", key), r#"/users:{"page":"2"}"#);
//!
//! // No parameters
//! let key = CacheKey::for_request("/users", &[]);
//! assert_eq!(format!("{}", key), "/users:{}");
//! ```

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

/// Per-request cache policy for GET requests.
///
/// Selected via [`CacheMode::QUERY_KEY`] in the query string or explicitly
/// on the request descriptor. The default is [`CacheMode::Offline`]: the
/// cache is written on every successful GET and consulted only when the
/// device is offline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CacheMode {
    /// Never read or write the cache. Offline requests fail immediately.
    Disabled,
    /// Write-through cache used as an offline fallback only.
    #[default]
    Offline,
    /// Return a cached entry immediately when present and refresh it with a
    /// fire-and-forget background call (stale-while-revalidate).
    Eager,
    /// Return a cached entry immediately when present, without arming any
    /// background refresh.
    Boss,
}

impl CacheMode {
    /// Reserved query key that selects the cache mode for a GET request.
    pub const QUERY_KEY: &'static str = "cache";

    /// True when the mode allows reading or writing cache entries.
    pub fn is_enabled(self) -> bool {
        !matches!(self, CacheMode::Disabled)
    }

    /// True when a cache hit short-circuits the online request path.
    pub fn serves_hit_while_online(self) -> bool {
        matches!(self, CacheMode::Eager | CacheMode::Boss)
    }

    /// True when a served hit also arms a background refresh.
    pub fn arms_background_refresh(self) -> bool {
        matches!(self, CacheMode::Eager)
    }

    /// Looks up the reserved query key in a pair list.
    pub fn from_query(query: &[(String, String)]) -> Option<CacheMode> {
        query
            .iter()
            .find(|(key, _)| key == Self::QUERY_KEY)
            .map(|(_, value)| value.parse().unwrap_or_default())
    }
}

impl FromStr for CacheMode {
    type Err = UnknownCacheMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(CacheMode::Disabled),
            "offline" => Ok(CacheMode::Offline),
            "eager" => Ok(CacheMode::Eager),
            "boss" => Ok(CacheMode::Boss),
            other => Err(UnknownCacheMode(other.to_owned())),
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheMode::Disabled => "disabled",
            CacheMode::Offline => "offline",
            CacheMode::Eager => "eager",
            CacheMode::Boss => "boss",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unrecognized cache mode value.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown cache mode: {0}")]
pub struct UnknownCacheMode(pub String);

/// Deterministic cache key for a GET request.
///
/// Two requests with the same path and the same query pairs in the same
/// order produce the same key. The serialized query is part of the key so
/// `/users?page=1` and `/users?page=2` cache independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    key: String,
}

/// Renders query pairs as a JSON object string in insertion order.
///
/// Shared by cache keys and the offline error messages, so both name the
/// request the same way.
pub fn query_json(query: &[(String, String)]) -> String {
    let params: Map<String, Value> = query
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    serde_json::to_string(&Value::Object(params)).unwrap_or_else(|_| "{}".to_owned())
}

impl CacheKey {
    /// Builds the key for a path and its query pairs.
    pub fn for_request(path: &str, query: &[(String, String)]) -> Self {
        Self {
            key: format!("{path}:{}", query_json(query)),
        }
    }

    /// Key string prefixed with a storage namespace.
    pub fn namespaced(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.key)
    }

    /// Key string without a namespace.
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
