use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docket_core::DocketError;

#[derive(Debug)]
pub struct DocketAxumError(pub anyhow::Error);

impl From<anyhow::Error> for DocketAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<DocketError> for DocketAxumError {
    fn from(e: DocketError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for DocketAxumError {
    fn into_response(self) -> Response {
        // Even behind anyhow contexts a DocketError keeps its status and message
        if let Some(docket) = self.0.chain().find_map(|e| e.downcast_ref::<DocketError>()) {
            let safe = docket.sanitize_for_client();
            let status = StatusCode::from_u16(safe.code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, Json(safe.to_json())).into_response();
        }

        // Anything else is an internal failure; its text stays in the logs
        tracing::error!(error = %self.0, "unhandled broker error");
        let docket = DocketError::service("Internal server error");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(docket.to_json())).into_response()
    }
}
