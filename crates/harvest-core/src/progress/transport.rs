//! Push-channel transport: opens the job progress stream and yields raw body chunks.
//!
//! `HttpTransport` is the production implementation (reqwest, one long-lived
//! GET per channel). Dropping the returned stream closes the connection.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use url::Url;

/// Body chunks of an open channel, in delivery order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("server answered HTTP {0}")]
    Http(u16),
    #[error("stream read failed: {0}")]
    Read(String),
    #[error("stream ended before the job finished")]
    StreamEnded,
}

#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Open the channel at `url`. Resolves once the server has accepted it.
    async fn open(&self, url: &Url) -> Result<ByteStream, TransportError>;
}

pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Self { http })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn map_request_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if let Some(status) = e.status() {
        TransportError::Http(status.as_u16())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Read(e.to_string())
    }
}

#[async_trait]
impl PushTransport for HttpTransport {
    async fn open(&self, url: &Url) -> Result<ByteStream, TransportError> {
        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http(status.as_u16()));
        }

        Ok(Box::pin(response.bytes_stream().map(|chunk| chunk.map_err(map_request_error))))
    }
}
