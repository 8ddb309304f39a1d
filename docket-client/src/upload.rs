use std::sync::Arc;

use bytes::Bytes;
use docket_core::{Capability, DocketError, DocketResult};

use crate::transport::ObjectTransport;

/// Writes one document to storage through a write capability.
///
/// One request, whole body, no retry: a rejected or failed write is final
/// for this upload and the caller has to start over with a fresh capability.
pub struct UploadCoordinator {
    transport: Arc<dyn ObjectTransport>,
}

impl UploadCoordinator {
    pub fn new(transport: Arc<dyn ObjectTransport>) -> Self {
        Self { transport }
    }

    /// `content_type` must be the type the capability was issued for, or
    /// storage rejects the write.
    pub async fn upload(
        &self,
        capability: &Capability,
        payload: Bytes,
        content_type: &str,
    ) -> DocketResult<()> {
        if !capability.is_write() {
            return Err(DocketError::validation(format!(
                "cannot upload with a {} capability",
                capability.operation
            )));
        }

        let size = payload.len();
        let response = self
            .transport
            .put(&capability.url, content_type, payload)
            .await
            .map_err(|e| {
                tracing::error!(key = %capability.key, error = %e, "upload request failed");
                DocketError::upload("upload request failed").with_source(e)
            })?;

        if !response.is_success() {
            tracing::error!(
                key = %capability.key,
                status = response.status,
                body = %String::from_utf8_lossy(&response.body),
                "storage rejected upload"
            );
            return Err(DocketError::upload(format!(
                "storage rejected upload with status {}",
                response.status
            )));
        }

        tracing::info!(key = %capability.key, size, "document uploaded");
        Ok(())
    }
}
