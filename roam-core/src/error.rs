//! The normalized API error type.
//!
//! Every failure a caller can observe is an [`ApiError`]: transport
//! failures, server error responses, synthesized offline errors and
//! cancellations all collapse into the one `{code, message, errors}` shape
//! at the pipeline boundary, exactly once. Construction logs the error as a
//! side effect, so an error caught and rethrown any number of times is
//! still logged a single time.

use std::collections::HashMap;
use std::fmt;

use http::StatusCode;
use serde::Deserialize;

/// Status code synthesized for the two offline-without-cache conditions.
pub const OFFLINE_STATUS: u16 = 599;

/// Message used when neither the server nor the status table supplies one.
const DEFAULT_ERROR_MESSAGE: &str = "Unknown error happened.";

/// Message carried by cancellation errors.
const CANCELLED_MESSAGE: &str = "Request has been cancelled by cancel() method.";

/// Normalized API error.
///
/// - `code` is the HTTP status of the server response, `0` when no response
///   was received at all, or [`OFFLINE_STATUS`] for synthesized offline
///   errors.
/// - `message` falls back from the server payload to the canonical status
///   reason phrase, then to a generic default.
/// - `errors` optionally carries server-side field validation messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// Numeric status code.
    pub code: u16,
    /// Human-readable message.
    pub message: String,
    /// Optional field-level error map from the server payload.
    pub errors: Option<HashMap<String, String>>,
}

/// Error payload shape servers attach to non-success responses.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: Option<ErrorPayloadMessage>,
    #[serde(default)]
    errors: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayloadMessage {
    message: String,
}

impl ApiError {
    /// Constructs an error, filling in the message fallback chain and
    /// logging it once as a side effect.
    pub fn new(
        code: u16,
        message: Option<String>,
        errors: Option<HashMap<String, String>>,
    ) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .or_else(|| status_text(code).map(str::to_owned))
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_owned());
        let error = Self {
            code,
            message,
            errors,
        };
        tracing::warn!(
            target: "roam::api",
            code = error.code,
            message = %error.message,
            errors = ?error.errors,
            "api request failed",
        );
        error
    }

    /// Error for a server response with a non-success status.
    ///
    /// The body is probed for the conventional `{message: {message},
    /// errors}` payload; absent or unparseable payloads fall back to the
    /// status text table.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorPayload>(body) {
            Ok(payload) => Self::new(
                status,
                payload.message.map(|m| m.message),
                payload.errors,
            ),
            Err(_) => Self::new(status, None, None),
        }
    }

    /// Error for a transport failure where no response was received.
    pub fn no_response(detail: impl fmt::Display) -> Self {
        Self::new(0, Some(detail.to_string()), None)
    }

    /// Synthesized error: device offline and caching disabled for the
    /// request.
    pub fn offline_cache_disabled(path: &str, params: &str) -> Self {
        Self::new(
            OFFLINE_STATUS,
            Some(format!(
                "The device is offline, and cache was disabled for this request: {path}{params}"
            )),
            None,
        )
    }

    /// Synthesized error: device offline and no cached entry exists for the
    /// request.
    pub fn offline_not_cached(path: &str, params: &str) -> Self {
        Self::new(
            OFFLINE_STATUS,
            Some(format!(
                "The device is offline, and the response is not cached for this request: {path}{params}"
            )),
            None,
        )
    }

    /// Error stored when an in-flight request is aborted via `cancel()`.
    pub fn cancelled() -> Self {
        Self::new(0, Some(CANCELLED_MESSAGE.to_owned()), None)
    }

    /// True for errors produced by intentional cancellation, so callers can
    /// special-case them (e.g. skip an error toast).
    pub fn is_cancelled(&self) -> bool {
        self.code == 0 && self.message == CANCELLED_MESSAGE
    }

    /// True for the synthesized offline errors.
    pub fn is_offline(&self) -> bool {
        self.code == OFFLINE_STATUS
    }
}

/// Canonical reason phrase for a status code, if any.
fn status_text(code: u16) -> Option<&'static str> {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_falls_back_to_status_text() {
        let error = ApiError::new(404, None, None);
        assert_eq!(error.message, "Not Found");
    }

    #[test]
    fn message_falls_back_to_default_for_unknown_codes() {
        let error = ApiError::new(0, None, None);
        assert_eq!(error.message, DEFAULT_ERROR_MESSAGE);
        let error = ApiError::new(599, None, None);
        assert_eq!(error.message, DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn empty_server_message_is_treated_as_absent() {
        let error = ApiError::new(500, Some(String::new()), None);
        assert_eq!(error.message, "Internal Server Error");
    }

    #[test]
    fn from_response_reads_payload_message_and_errors() {
        let body = br#"{"message":{"message":"Validation failed","status":"error"},"errors":{"email":"is invalid"}}"#;
        let error = ApiError::from_response(422, body);
        assert_eq!(error.code, 422);
        assert_eq!(error.message, "Validation failed");
        assert_eq!(error.errors.unwrap()["email"], "is invalid");
    }

    #[test]
    fn from_response_tolerates_non_json_bodies() {
        let error = ApiError::from_response(502, b"<html>bad gateway</html>");
        assert_eq!(error.code, 502);
        assert_eq!(error.message, "Bad Gateway");
        assert!(error.errors.is_none());
    }

    #[test]
    fn cancellation_is_distinguishable() {
        let error = ApiError::cancelled();
        assert!(error.is_cancelled());
        assert!(!ApiError::new(0, None, None).is_cancelled());
    }

    #[test]
    fn offline_errors_use_reserved_status() {
        let error = ApiError::offline_not_cached("/users", "{}");
        assert_eq!(error.code, OFFLINE_STATUS);
        assert!(error.is_offline());
        assert!(error.message.contains("/users"));
    }
}
