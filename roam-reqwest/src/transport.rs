//! Reqwest-backed transport.

use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use roam::{Transport, TransportError, TransportResponse};
use roam_core::{Body, RequestDescriptor};

/// [`Transport`] executing requests through a shared [`reqwest::Client`].
///
/// Expects the descriptor path to be a fully resolved URL; the client
/// pipeline resolves the base URL before the transport runs. Any HTTP
/// response, successful or not, comes back as a [`TransportResponse`];
/// only connection-level failures map to [`TransportError`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default reqwest client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport over a preconfigured reqwest client (custom
    /// timeouts, proxies, TLS setup).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        request: RequestDescriptor,
    ) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.path());

        let mut headers = request.headers().clone();
        if request.body().is_multipart() {
            // reqwest must set the multipart content type itself so the
            // boundary parameter is included.
            headers.remove(CONTENT_TYPE);
        }
        builder = builder.headers(headers);

        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }

        match request.body() {
            Body::Empty => {}
            Body::Json(value) => {
                builder = builder.json(value);
            }
            Body::Multipart(parts) => {
                let mut form = reqwest::multipart::Form::new();
                for part in parts {
                    let mut piece = reqwest::multipart::Part::bytes(part.data.to_vec());
                    if let Some(file_name) = &part.file_name {
                        piece = piece.file_name(file_name.clone());
                    }
                    if let Some(content_type) = &part.content_type {
                        piece = piece.mime_str(content_type).map_err(TransportError::new)?;
                    }
                    form = form.part(part.name.clone(), piece);
                }
                builder = builder.multipart(form);
            }
        }

        let response = builder.send().await.map_err(TransportError::new)?;
        let status = response.status();
        let body = response.bytes().await.map_err(TransportError::new)?;
        Ok(TransportResponse { status, body })
    }
}
