//! docket-axum: HTTP surface for the Docket broker.
//!
//! Exposes `GET /get-upload-url?filename=` and `GET /get-presigned-url?key=`,
//! each answering `{url}` or `{error}`.

pub mod app;
pub mod routes;
pub mod state;
mod error;
pub use error::DocketAxumError;
pub use state::BrokerState;

pub use app::{broker_app, BrokerApp};
