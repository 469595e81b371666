use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Failures surfaced to the caller of the gateway.
///
/// Per-container upstream failures are not part of this taxonomy: they travel
/// as field-level errors inside a successful response.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Required input (vehicle id, authorization code) is missing.
    #[error("{0}")]
    InvalidRequest(String),
    /// Token exchange failed, or an upstream API rejected the token.
    #[error("{0}")]
    AuthenticationFailed(String),
    /// Every source came back empty or with errors only.
    #[error("Did not get any data for VIN {vehicle_id}")]
    NoDataAvailable { vehicle_id: String },
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::NoDataAvailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, "An error occurred: {}", self);
        } else {
            warn!(%status, "request rejected: {}", self);
        }

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
