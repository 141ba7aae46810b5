//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("unknown supply filter: {0}")]
    UnknownFilter(String),

    #[error("supply has not been fetched yet")]
    SupplyUnavailable,

    #[error("metrics are disabled")]
    MetricsDisabled,

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidParameter { .. } | Self::MissingParameter(_) => StatusCode::BAD_REQUEST,
            Self::UnknownFilter(_) | Self::MetricsDisabled => StatusCode::NOT_FOUND,
            Self::SupplyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::MissingParameter(_) => "missing_parameter",
            Self::UnknownFilter(_) => "unknown_filter",
            Self::SupplyUnavailable => "supply_unavailable",
            Self::MetricsDisabled => "metrics_disabled",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            code: self.code(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
