use std::sync::Arc;

use docket_core::{BrokerSettings, Capability, DocketError, DocketResult, Operation};

use crate::store::CapabilitySigner;

/// Issues short-lived, operation-scoped capability URLs.
///
/// The broker holds no mutable state; clone the `Arc` and call it from as
/// many tasks as you like. It does not authenticate callers.
pub struct UrlBroker {
    signer: Arc<dyn CapabilitySigner>,
    settings: BrokerSettings,
}

impl UrlBroker {
    pub fn new<S: CapabilitySigner + 'static>(signer: S, settings: BrokerSettings) -> Self {
        Self {
            signer: Arc::new(signer),
            settings,
        }
    }

    pub fn from_shared(signer: Arc<dyn CapabilitySigner>, settings: BrokerSettings) -> Self {
        Self { signer, settings }
    }

    pub fn settings(&self) -> &BrokerSettings {
        &self.settings
    }

    /// Issue a capability for one operation on `key`.
    ///
    /// Write capabilities last `write_expiry` and are pinned to
    /// `upload_content_type`; read capabilities last `read_expiry`. Signing
    /// failures become `ServiceError` and are never retried here.
    pub async fn issue_capability(&self, key: &str, operation: Operation) -> DocketResult<Capability> {
        if key.is_empty() {
            return Err(DocketError::validation("Missing key"));
        }

        let capability = match operation {
            Operation::Write => {
                let expires_in = self.settings.write_expiry;
                let content_type = self.settings.upload_content_type.as_str();
                let url = self
                    .signer
                    .sign_put(key, content_type, expires_in)
                    .await
                    .map_err(|e| {
                        tracing::error!(key = %key, error = %e, "failed to sign upload url");
                        DocketError::service("Failed to generate upload URL").with_source(e)
                    })?;
                Capability::write(key, url, expires_in, content_type)
            }
            Operation::Read => {
                let expires_in = self.settings.read_expiry;
                let url = self.signer.sign_get(key, expires_in).await.map_err(|e| {
                    tracing::error!(key = %key, error = %e, "failed to sign download url");
                    DocketError::service("Failed to generate download URL").with_source(e)
                })?;
                Capability::read(key, url, expires_in)
            }
        };

        tracing::debug!(
            key = %key,
            operation = %operation,
            expires_in_secs = capability.expires_in.map(|d| d.as_secs()).unwrap_or_default(),
            "capability issued"
        );

        Ok(capability)
    }

    /// Write capability for `uploads/<filename>`.
    pub async fn issue_upload(&self, filename: &str) -> DocketResult<Capability> {
        if filename.is_empty() {
            return Err(DocketError::validation("Missing filename"));
        }
        let key = format!("{}{}", self.settings.upload_prefix, filename);
        self.issue_capability(&key, Operation::Write).await
    }

    /// Read capability for an arbitrary key, typically a derived result key.
    pub async fn issue_read(&self, key: &str) -> DocketResult<Capability> {
        self.issue_capability(key, Operation::Read).await
    }
}
