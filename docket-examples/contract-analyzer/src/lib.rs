//! Contract analyzer: a Docket broker plus a command-line submitter.

pub mod config;
mod storage;

use anyhow::Result;
use docket_axum::{broker_app, BrokerApp};
use docket_blob::UrlBroker;
use docket_core::DocketConfigSnapshot;

/// Build the broker service for `config`.
///
/// With `storage.backend=local` this also starts the in-process object
/// server, which lives as long as the returned app.
pub async fn build(config: &DocketConfigSnapshot) -> Result<BrokerApp> {
    let settings = config.broker_settings()?;
    config.poll_settings()?.validate_against(settings.read_expiry)?;

    let signer = storage::signer(config).await?;
    Ok(broker_app(UrlBroker::from_shared(signer, settings)))
}
