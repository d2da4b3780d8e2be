//! The transport seam.
//!
//! A [`Transport`] executes one [`RequestDescriptor`] over the network and
//! returns the raw status/body pair for any HTTP response the server
//! produced, successful or not. Only the case where no response was
//! received at all — connection refused, DNS failure, aborted stream — is
//! an error at this seam. The pipeline turns both shapes into [`ApiError`]s
//! at its boundary.
//!
//! [`ApiError`]: roam_core::ApiError

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use roam_core::{Raw, RequestDescriptor};

/// Raw response produced by a transport.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Full response body.
    pub body: Raw,
}

/// Transport failure where no HTTP response was received.
#[derive(Debug, thiserror::Error)]
#[error("no response received: {source}")]
pub struct TransportError {
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl TransportError {
    /// Wraps the underlying transport failure.
    pub fn new(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Builds an error from a plain message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            source: message.into().into(),
        }
    }
}

/// Executes requests over the network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the call described by `request`.
    async fn execute(&self, request: RequestDescriptor)
    -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn execute(
        &self,
        request: RequestDescriptor,
    ) -> Result<TransportResponse, TransportError> {
        (**self).execute(request).await
    }
}
