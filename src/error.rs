use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("{0}")]
    Validation(String),
    #[error("user not found")]
    UserNotFound,
    #[error("payment not found")]
    PaymentNotFound,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("payment service not configured")]
    Configuration(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::Validation(_) => StatusCode::BAD_REQUEST,
            PaymentError::UserNotFound | PaymentError::PaymentNotFound => StatusCode::NOT_FOUND,
            PaymentError::InvalidSignature => StatusCode::UNAUTHORIZED,
            PaymentError::Configuration(_) | PaymentError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::Validation(_) => "VALIDATION_ERROR",
            PaymentError::UserNotFound => "USER_NOT_FOUND",
            PaymentError::PaymentNotFound => "PAYMENT_NOT_FOUND",
            PaymentError::InvalidSignature => "INVALID_SIGNATURE",
            PaymentError::Configuration(_) => "SERVICE_NOT_CONFIGURED",
            PaymentError::Store(_) => "INTERNAL_ERROR",
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let message = match self {
            PaymentError::Store(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        err(self.code(), &message)
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        match &self {
            PaymentError::Store(e) => tracing::error!(error = %e, "store failure"),
            PaymentError::Configuration(detail) => {
                tracing::error!(detail = %detail, "payment gateway misconfigured")
            }
            _ => {}
        }
        (self.status_code(), Json(self.envelope())).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

pub fn err(code: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        },
    }
}
