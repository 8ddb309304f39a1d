//! docket-core: shared vocabulary for Docket.
//!
//! Result key derivation, the capability data model, the protocol's error
//! kinds, configuration and the submission state record. Nothing in here
//! performs I/O.

pub mod capability;
pub mod config;
pub mod errors;
pub mod flow;
pub mod keys;

pub use capability::{Capability, CapabilityResponse, Operation};
pub use config::{BrokerSettings, DocketConfig, DocketConfigSnapshot, PollSettings};
pub use errors::{DocketError, DocketResult, ErrorKind, USER_NOTICE};
pub use flow::{Document, FlowState};
pub use keys::{derive_result_key, result_key_for_upload_key, sanitize_base_name, upload_key};
