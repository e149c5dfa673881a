use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use vitgen_core::error::{ErrorCategory, VitgenError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Http { status: StatusCode, message: String },
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self::Http {
            status: StatusCode::METHOD_NOT_ALLOWED,
            message: "only GET is allowed".into(),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Http { status, .. } => *status,
        }
    }
}

impl From<VitgenError> for ApiError {
    fn from(e: VitgenError) -> Self {
        let status = match e.category() {
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::Http {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Http { status, message } => {
                (status, Json(serde_json::json!({ "error": message }))).into_response()
            }
        }
    }
}
