use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use docket_core::{DocketError, DocketResult};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

/// What storage answered to a capability request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageResponse {
    pub status: u16,
    pub body: Bytes,
}

impl StorageResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Raw access to capability-URL-addressed storage.
///
/// A returned `Err` means the request never produced a status (connection
/// refused, reset, timed out); any status at all is an `Ok`.
#[async_trait]
pub trait ObjectTransport: Send + Sync {
    async fn put(&self, url: &str, content_type: &str, body: Bytes) -> DocketResult<StorageResponse>;

    async fn get(&self, url: &str) -> DocketResult<StorageResponse>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Option<Duration>,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client, timeout: None }
    }

    /// Per-request timeout; a request that exceeds it counts as a transport failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn send(&self, mut request: reqwest::RequestBuilder) -> DocketResult<StorageResponse> {
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DocketError::transport(format!("storage request failed: {e}")).with_source(e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| DocketError::transport(format!("storage response was cut short: {e}")).with_source(e))?;

        Ok(StorageResponse { status, body })
    }
}

#[async_trait]
impl ObjectTransport for HttpTransport {
    async fn put(&self, url: &str, content_type: &str, body: Bytes) -> DocketResult<StorageResponse> {
        self.send(self.client.put(url).header(CONTENT_TYPE, content_type).body(body))
            .await
    }

    async fn get(&self, url: &str) -> DocketResult<StorageResponse> {
        self.send(self.client.get(url)).await
    }
}
