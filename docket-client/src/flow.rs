use std::sync::Arc;
use std::time::Duration;

use docket_core::{
    derive_result_key, DocketConfigSnapshot, DocketError, DocketResult, Document, FlowState,
};
use tokio_util::sync::CancellationToken;

use crate::broker_client::{BrokerClient, CapabilitySource};
use crate::poller::{PollOptions, ResultPoller};
use crate::transport::{HttpTransport, ObjectTransport};
use crate::upload::UploadCoordinator;

pub const DEFAULT_BROKER_URL: &str = "http://localhost:4000";
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Drives one submission end to end: upload, derive the result key, then
/// wait for the report.
pub struct Orchestrator {
    source: Arc<dyn CapabilitySource>,
    uploader: UploadCoordinator,
    poller: ResultPoller,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn CapabilitySource>,
        transport: Arc<dyn ObjectTransport>,
        options: PollOptions,
    ) -> Self {
        Self {
            source,
            uploader: UploadCoordinator::new(Arc::clone(&transport)),
            poller: ResultPoller::new(transport, options),
        }
    }

    /// Build against the broker at `broker.url`.
    ///
    /// Fails when the polling window would outlive the read capability it
    /// polls with.
    pub fn from_config(config: &DocketConfigSnapshot) -> DocketResult<Self> {
        let broker = config.broker_settings()?;
        let poll = config.poll_settings()?;
        poll.validate_against(broker.read_expiry)?;

        let broker_url = config.get_or("broker.url", DEFAULT_BROKER_URL);
        let client = BrokerClient::new(broker_url).with_upload_prefix(broker.upload_prefix);
        let storage_timeout = config
            .get_u64("storage.request_timeout_ms")?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_STORAGE_TIMEOUT);

        Ok(Self::new(
            Arc::new(client),
            Arc::new(HttpTransport::default().with_timeout(storage_timeout)),
            PollOptions::from(poll),
        ))
    }

    pub fn poll_options(&self) -> &PollOptions {
        self.poller.options()
    }

    /// Submit `document` and return the report text.
    ///
    /// Steps run strictly in order and the first failure ends the submission.
    pub async fn submit(&self, document: &Document, cancel: &CancellationToken) -> DocketResult<String> {
        if document.filename.is_empty() {
            return Err(DocketError::validation("Missing filename"));
        }
        if cancel.is_cancelled() {
            return Err(DocketError::cancelled("submission cancelled"));
        }

        let write = self.source.upload_capability(&document.filename).await?;
        self.uploader
            .upload(&write, document.bytes.clone(), &document.content_type)
            .await?;

        let result_key = derive_result_key(&document.filename);
        tracing::info!(filename = %document.filename, result_key = %result_key, "waiting for report");

        let read = self.source.read_capability(&result_key).await?;
        let body = self.poller.poll_with_cancel(&read, cancel).await?;

        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Advance `state` through a full submission.
    ///
    /// Only `FileChosen` starts anything; any other state comes back as is.
    pub async fn run(&self, state: FlowState, cancel: &CancellationToken) -> FlowState {
        let (document, uploading) = match state.begin() {
            Ok(started) => started,
            Err(unchanged) => return unchanged,
        };

        match self.submit(&document, cancel).await {
            Ok(report) => uploading.succeed(report),
            Err(e) => {
                tracing::error!(filename = %document.filename, error = %e, "submission failed");
                uploading.fail(&e)
            }
        }
    }
}
