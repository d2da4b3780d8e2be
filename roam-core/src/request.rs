//! Outgoing request description.
//!
//! A [`RequestDescriptor`] is an immutable value describing one outgoing
//! call: method, path, query, body, headers and the cache mode selected for
//! it. Pipeline stages (authorization, content-type defaulting, URL
//! resolution) each consume a descriptor and return a new one, so the
//! ordering of transformations stays auditable and no stage observes
//! another stage's in-place mutation.

use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde_json::Value;

use crate::cache::CacheMode;

/// One part of a multipart form body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    /// Form field name.
    pub name: String,
    /// Optional file name for file parts.
    pub file_name: Option<String>,
    /// Optional content type of this part.
    pub content_type: Option<String>,
    /// Raw part payload.
    pub data: bytes::Bytes,
}

/// Request payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    /// No payload.
    #[default]
    Empty,
    /// JSON payload, sent with `Content-Type: application/json`.
    Json(Value),
    /// Multipart form payload, sent with `Content-Type: multipart/form-data`.
    Multipart(Vec<MultipartPart>),
}

impl Body {
    /// Returns true when the body carries multipart form data.
    pub fn is_multipart(&self) -> bool {
        matches!(self, Body::Multipart(_))
    }
}

/// Immutable description of an outgoing request.
///
/// Built once by the caller, then threaded through the pipeline as a value.
/// Every `with_*` method consumes the descriptor and returns a new one.
///
/// # Example
///
/// ```
/// use roam_core::{CacheMode, RequestDescriptor};
/// use http::Method;
///
/// let request = RequestDescriptor::new(Method::GET, "/users")
///     .with_query([("page", "2")])
///     .with_cache_mode(CacheMode::Eager);
///
/// assert_eq!(request.path(), "/users");
/// assert_eq!(request.cache_mode(), CacheMode::Eager);
/// ```
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Body,
    headers: HeaderMap,
    cache_mode: CacheMode,
}

impl RequestDescriptor {
    /// Creates a descriptor for the given method and path.
    ///
    /// The path is base-relative; absolute URLs are passed through to the
    /// transport untouched.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
            headers: HeaderMap::new(),
            cache_mode: CacheMode::default(),
        }
    }

    /// Shorthand for a GET descriptor.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a POST descriptor.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Shorthand for a PUT descriptor.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Shorthand for a DELETE descriptor.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends query parameters, preserving insertion order.
    ///
    /// The reserved `cache` key additionally selects the cache mode for GET
    /// requests; unknown values fall back to the default mode. The pair
    /// stays in the query (and therefore in the cache key), matching how
    /// callers see it on the wire.
    pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            let (key, value) = (key.into(), value.into());
            if key == CacheMode::QUERY_KEY {
                self.cache_mode = value.parse().unwrap_or_default();
            }
            self.query.push((key, value));
        }
        self
    }

    /// Replaces the body with a JSON payload.
    pub fn with_json(mut self, value: Value) -> Self {
        self.body = Body::Json(value);
        self
    }

    /// Replaces the body with a multipart form payload.
    pub fn with_multipart(mut self, parts: Vec<MultipartPart>) -> Self {
        self.body = Body::Multipart(parts);
        self
    }

    /// Sets a header, replacing any previous value under the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the cache mode explicitly, overriding the reserved query key.
    pub fn with_cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Replaces the path, used by the pipeline to resolve the base URL.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets `Content-Type` from the body shape unless the caller already
    /// provided one: `application/json` by default, `multipart/form-data`
    /// for multipart bodies.
    pub fn with_default_content_type(mut self) -> Self {
        if !self.headers.contains_key(CONTENT_TYPE) {
            let value = if self.body.is_multipart() {
                HeaderValue::from_static("multipart/form-data")
            } else {
                HeaderValue::from_static("application/json")
            };
            self.headers.insert(CONTENT_TYPE, value);
        }
        self
    }

    /// Sets the `Authorization` header.
    pub fn with_authorization(mut self, value: HeaderValue) -> Self {
        self.headers.insert(AUTHORIZATION, value);
        self
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path (base-relative until the pipeline resolves it).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Request body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Cache mode selected for this request.
    pub fn cache_mode(&self) -> CacheMode {
        self.cache_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_preserves_insertion_order() {
        let request = RequestDescriptor::get("/items")
            .with_query([("b", "2"), ("a", "1")])
            .with_query([("c", "3")]);
        let keys: Vec<&str> = request.query().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn reserved_query_key_selects_cache_mode() {
        let request = RequestDescriptor::get("/items").with_query([("cache", "eager")]);
        assert_eq!(request.cache_mode(), CacheMode::Eager);
        // The pair stays visible in the query.
        assert_eq!(request.query().len(), 1);
    }

    #[test]
    fn unknown_cache_value_falls_back_to_default() {
        let request = RequestDescriptor::get("/items").with_query([("cache", "bogus")]);
        assert_eq!(request.cache_mode(), CacheMode::Offline);
    }

    #[test]
    fn default_content_type_respects_existing_header() {
        let request = RequestDescriptor::post("/upload")
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/csv"))
            .with_default_content_type();
        assert_eq!(request.headers()[CONTENT_TYPE], "text/csv");
    }

    #[test]
    fn default_content_type_switches_for_multipart() {
        let request = RequestDescriptor::post("/upload")
            .with_multipart(vec![MultipartPart {
                name: "file".into(),
                file_name: Some("a.bin".into()),
                content_type: None,
                data: bytes::Bytes::from_static(b"\x00\x01"),
            }])
            .with_default_content_type();
        assert_eq!(request.headers()[CONTENT_TYPE], "multipart/form-data");
    }
}
