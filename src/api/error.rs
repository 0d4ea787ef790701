use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::TraderError;

/// A failed request, rendered as `{"error": message}`
#[derive(Debug)]
pub struct ApiError(pub TraderError);

impl From<TraderError> for ApiError {
    fn from(err: TraderError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TraderError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            TraderError::DataUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TraderError::ModelUnavailable(_) => StatusCode::NOT_FOUND,
            TraderError::MarketData(_) | TraderError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, fatal = self.0.is_fatal(), "request failed: {}", self.0);
        } else {
            warn!(%status, "request rejected: {}", self.0);
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
