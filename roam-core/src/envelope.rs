//! Response envelope types.
//!
//! Servers wrap returned data in a structured envelope carrying optional
//! human-readable messages, pagination and free-form metadata. The envelope
//! is what the cache persists and what request-state handles expose.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Server-provided message attached to a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Human-readable message text.
    pub message: String,
    /// Message status label (e.g. "success", "warning").
    pub status: Option<String>,
}

/// Pagination block for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based index of the returned page.
    pub current_page: u64,
    /// Index of the last available page.
    pub last_page: u64,
    /// Page size the server applied.
    pub limit: u64,
    /// Total number of records across all pages.
    pub total: u64,
}

/// Structured wrapper around returned data.
///
/// `T` is the payload type, `M` the shape of the optional `meta` block
/// (defaults to a free-form JSON value).
///
/// ```
/// use roam_core::Envelope;
///
/// let envelope: Envelope<Vec<u32>> =
///     serde_json::from_str(r#"{"data":[1,2,3],"pagination":{"current_page":1,"last_page":1,"limit":20,"total":3}}"#)
///         .unwrap();
/// assert_eq!(envelope.data, vec![1, 2, 3]);
/// assert_eq!(envelope.pagination.unwrap().total, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T, M = serde_json::Value> {
    /// The payload.
    pub data: T,
    /// Optional server message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<ResponseMessage>,
    /// Optional pagination block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    /// Optional free-form metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<M>,
}

impl<T, M> Envelope<T, M> {
    /// Wraps bare data in an envelope with no message, pagination or meta.
    pub fn of(data: T) -> Self {
        Self {
            data,
            message: None,
            pagination: None,
            meta: None,
        }
    }
}

impl<T, M> Envelope<T, M>
where
    T: DeserializeOwned,
    M: DeserializeOwned,
{
    /// Deserializes an envelope from a raw JSON body.
    pub fn from_json(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }
}
