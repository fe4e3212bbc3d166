use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{processor::ProcessorError, response::ErrorBody};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("The minimum amount is 0.50 €")]
    BelowMinimum,

    #[error("Payment has not been confirmed")]
    PaymentNotConfirmed,

    #[error("File too large (max 3 MB)")]
    FileTooLarge,

    #[error("{0}")]
    Processor(#[from] ProcessorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed stored data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::BelowMinimum
            | AppError::PaymentNotConfirmed
            | AppError::FileTooLarge
            | AppError::Processor(_) => StatusCode::BAD_REQUEST,
            AppError::Io(_) | AppError::Json(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            tracing::warn!(error = %self, status = %status, "request rejected");
            self.to_string()
        };

        (status, axum::Json(ErrorBody::new(message))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
