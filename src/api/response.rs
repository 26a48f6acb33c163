use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::core::error::{ErrorKind, RateError, ValidationError};

/// Body of every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body of successful admin requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    Body(String),
    Rate(RateError),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<RateError> for ApiError {
    fn from(e: RateError) -> Self {
        Self::Rate(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection.body_text())
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidAmount
        | ErrorKind::NegativeAmount
        | ErrorKind::InvalidRate
        | ErrorKind::NonPositiveRate
        | ErrorKind::EmptyCode
        | ErrorKind::InvalidCodeLength
        | ErrorKind::InvalidCodeCharacters => StatusCode::BAD_REQUEST,
        ErrorKind::CurrencyNotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::ProviderUnavailable => StatusCode::BAD_GATEWAY,
        ErrorKind::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(e) => (status_for(e.kind()), e.to_string()),
            ApiError::Body(text) => (StatusCode::BAD_REQUEST, text),
            ApiError::Rate(e) => {
                let status = status_for(e.kind());
                if status.is_server_error() {
                    error!(error = %e, kind = ?e.kind(), "Request failed");
                } else {
                    warn!(error = %e, kind = ?e.kind(), "Request rejected");
                }
                (status, e.to_string())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
