use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::fmt;
use tracing::error;

use aiden_core::AidenError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "status": "error",
            "error": self.message,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }

        (self.status, Json(body)).into_response()
    }
}

impl From<AidenError> for AppError {
    fn from(err: AidenError) -> Self {
        match err {
            AidenError::Validation(msg) => Self::unprocessable(msg),
            AidenError::DuplicateEmails(emails) => {
                Self::unprocessable("Duplicate emails detected in upload.")
                    .with_details(json!({ "duplicate_emails": emails }))
            }
            AidenError::ExistingEmails(emails) => {
                Self::unprocessable("Some employees already exist.")
                    .with_details(json!({ "existing_emails": emails }))
            }
            AidenError::NotFound(msg) => Self::not_found(msg),
            AidenError::Unauthorized(msg) => Self::unauthorized(msg),
            AidenError::Forbidden(_) => Self::forbidden("Forbidden"),
            AidenError::Conflict(msg) => Self::conflict(msg),
            err @ AidenError::InvalidTransition { .. } => {
                Self::conflict(err.to_string())
            }
            AidenError::ExternalService { service, cause } => {
                Self::bad_gateway(format!("{service} service request failed"))
                    .with_details(json!({ "service": service, "cause": cause }))
            }
            err @ AidenError::Decryption(_) => {
                error!(error = %err, "stored payload could not be decrypted");
                Self::internal("Stored data could not be read")
            }
            err @ AidenError::Database(_) => {
                error!(error = %err, "database operation failed");
                Self::internal("Database operation failed")
            }
            err @ (AidenError::Serialization(_) | AidenError::Internal(_)) => {
                error!(error = %err, "request failed");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = %err, "request failed");
        Self::internal("Internal server error")
    }
}
