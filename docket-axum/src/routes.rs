use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    routing, Json, Router,
};
use docket_core::{CapabilityResponse, DocketError};

use crate::{BrokerState, DocketAxumError};

pub const UPLOAD_URL_PATH: &str = "/get-upload-url";
pub const READ_URL_PATH: &str = "/get-presigned-url";

// Absent and empty parameters are the same failure.
fn required<'a>(query: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    query.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

async fn get_upload_url(
    State(state): State<BrokerState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<CapabilityResponse>, DocketAxumError> {
    let filename = required(&query, "filename").ok_or_else(|| DocketError::validation("Missing filename"))?;

    let capability = state.broker.issue_upload(filename).await?;
    Ok(Json(CapabilityResponse::from(&capability)))
}

async fn get_presigned_url(
    State(state): State<BrokerState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<CapabilityResponse>, DocketAxumError> {
    let key = required(&query, "key").ok_or_else(|| DocketError::validation("Missing key"))?;

    let capability = state.broker.issue_read(key).await?;
    Ok(Json(CapabilityResponse::from(&capability)))
}

pub fn broker_router(state: BrokerState) -> Router<()> {
    Router::new()
        .route(UPLOAD_URL_PATH, routing::get(get_upload_url))
        .route(READ_URL_PATH, routing::get(get_presigned_url))
        .route("/health", routing::get(|| async { "ok" }))
        .with_state(state)
}
