use async_trait::async_trait;
use docket_core::{Capability, CapabilityResponse, DocketError, DocketResult, Operation};
use reqwest::Client;
use serde::Deserialize;

/// Where a client gets its capabilities from.
#[async_trait]
pub trait CapabilitySource: Send + Sync {
    /// Write capability for `uploads/<filename>`.
    async fn upload_capability(&self, filename: &str) -> DocketResult<Capability>;

    /// Read capability for `key`.
    async fn read_capability(&self, key: &str) -> DocketResult<Capability>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the broker endpoints.
#[derive(Debug, Clone)]
pub struct BrokerClient {
    client: Client,
    base_url: String,
    upload_prefix: String,
}

impl BrokerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            upload_prefix: docket_core::keys::UPLOAD_PREFIX.to_string(),
        }
    }

    /// Prefix the broker files uploads under, when it is not `uploads/`.
    pub fn with_upload_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.upload_prefix = prefix.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request_url(&self, path: &str, param: &str, value: &str) -> DocketResult<String> {
        let url = format!(
            "{}{}?{}={}",
            self.base_url,
            path,
            param,
            urlencoding::encode(value)
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            DocketError::transport(format!("broker unreachable: {e}")).with_source(e)
        })?;

        let status = response.status();
        if status.is_success() {
            let body: CapabilityResponse = response.json().await.map_err(|e| {
                DocketError::service(format!("malformed broker reply: {e}")).with_source(e)
            })?;
            return Ok(body.url);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|b| b.error)
            .unwrap_or_else(|_| format!("broker answered {status}"));

        tracing::warn!(path = %path, status = status.as_u16(), error = %message, "broker refused capability request");

        if status.as_u16() == 400 {
            Err(DocketError::validation(message))
        } else {
            Err(DocketError::service(message))
        }
    }
}

#[async_trait]
impl CapabilitySource for BrokerClient {
    async fn upload_capability(&self, filename: &str) -> DocketResult<Capability> {
        let url = self.request_url("/get-upload-url", "filename", filename).await?;
        let key = format!("{}{}", self.upload_prefix, filename);
        Ok(Capability::received(Operation::Write, key, url))
    }

    async fn read_capability(&self, key: &str) -> DocketResult<Capability> {
        let url = self.request_url("/get-presigned-url", "key", key).await?;
        Ok(Capability::received(Operation::Read, key, url))
    }
}
