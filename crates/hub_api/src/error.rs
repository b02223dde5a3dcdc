use axum::{Json, http::StatusCode, response::IntoResponse};
use hub_core::StationError;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> impl IntoResponse {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub(crate) fn station_error_to_response(error: StationError) -> impl IntoResponse {
    let status = match error {
        StationError::TruckNotQueued { .. } | StationError::SlotNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        StationError::InvalidTransition { .. } => StatusCode::CONFLICT,
    };
    error_response(status, error.to_string())
}
