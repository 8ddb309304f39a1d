//! # docket-blob: capability URL brokering
//!
//! `docket-blob` issues the signed URLs that let a client talk to object
//! storage directly, without the server ever touching the document bytes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │      UrlBroker       │  ← validation, expiry, content-type pinning
//! ├──────────────────────┤
//! │   CapabilitySigner   │  ← storage-specific URL signing
//! ├──────────┬───────────┤
//! │    S3    │   Local   │  ← aws-sdk-s3 presigning / HMAC + axum server
//! └──────────┴───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docket_blob::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let objects = Arc::new(MemoryObjectStore::new());
//! let store = LocalSignedUrlStore::new(objects).await?;
//! let broker = UrlBroker::new(store, BrokerSettings::default());
//!
//! let upload = broker.issue_upload("contract.pdf").await?;
//! println!("PUT {}", upload.url);
//! # Ok(())
//! # }
//! ```

pub mod broker;
mod error;
mod local_store;
mod memory_store;
mod s3_store;
pub mod store;

pub use broker::UrlBroker;
pub use error::{BlobError, BlobResult};
pub use local_store::LocalSignedUrlStore;
pub use memory_store::MemoryObjectStore;
pub use s3_store::{S3CompatibleStore, S3Config};
pub use store::{CapabilitySigner, ObjectHead, ObjectStore, PutResult, StoredObject};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobError, BlobResult, CapabilitySigner, LocalSignedUrlStore, MemoryObjectStore,
        ObjectStore, S3CompatibleStore, S3Config, UrlBroker,
    };
    pub use docket_core::{BrokerSettings, Capability, Operation};
}
