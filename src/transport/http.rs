//! HTTP source for the analysis backend's streaming endpoint.
//!
//! The backend owns provider credentials and prompt construction. This side
//! only posts the analyst input and relays the event-stream body.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use super::ChunkSource;
use crate::config::AppConfig;
use crate::error::TransportError;

/// What the analyst handed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// A URL the backend fetches and analyses.
    Url,
    /// Raw report text.
    Text,
}

/// Request body for the streaming endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamRequest {
    pub input: String,
    pub mode: InputMode,
}

impl StreamRequest {
    pub fn url(url: impl Into<String>) -> Self {
        Self { input: url.into(), mode: InputMode::Url }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self { input: text.into(), mode: InputMode::Text }
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// An open streaming response.
pub struct HttpSource {
    response: reqwest::Response,
    received: usize,
}

impl HttpSource {
    /// Send `request` and wait for the response headers.
    ///
    /// # Errors
    ///
    /// - [`TransportError::HttpClientBuild`] if the client cannot be built
    /// - [`TransportError::Request`] if the request cannot be sent
    /// - [`TransportError::Status`] for any non-200 response, with its body
    pub async fn connect(config: &AppConfig, request: &StreamRequest) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| TransportError::HttpClientBuild(e.to_string()))?;

        let url = config.stream_url();
        info!(%url, mode = ?request.mode, "stream: connecting");

        let response = http
            .post(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }
        Ok(Self { response, received: 0 })
    }
}

#[async_trait::async_trait]
impl ChunkSource for HttpSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let chunk = self
            .response
            .chunk()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        match chunk {
            Some(bytes) => {
                self.received += bytes.len();
                Ok(Some(bytes.to_vec()))
            }
            None => {
                debug!(bytes = self.received, "stream: response body ended");
                Ok(None)
            }
        }
    }
}
