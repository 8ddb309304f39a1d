//! # Docket client
//!
//! Submits a document straight to storage through a broker-issued write
//! capability, then polls a read capability for the derived result key until
//! the analysis report shows up or the attempt budget runs out.
//!
//! ```rust,no_run
//! use docket_client::Orchestrator;
//! use docket_core::{DocketConfig, Document};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> docket_core::DocketResult<()> {
//! let orchestrator = Orchestrator::from_config(&DocketConfig::new().snapshot())?;
//! let document = Document::new("Lease.pdf", "application/pdf", std::fs::read("Lease.pdf").unwrap_or_default());
//! let report = orchestrator.submit(&document, &CancellationToken::new()).await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod broker_client;
pub mod flow;
pub mod poller;
pub mod transport;
pub mod upload;

#[cfg(test)]
mod testing;

pub use broker_client::{BrokerClient, CapabilitySource};
pub use flow::{Orchestrator, DEFAULT_BROKER_URL};
pub use poller::{AttemptOutcome, PollAttempt, PollOptions, PollState, ResultPoller};
pub use transport::{HttpTransport, ObjectTransport, StorageResponse};
pub use upload::UploadCoordinator;
