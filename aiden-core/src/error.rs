use aiden_model::ModelError;
use thiserror::Error;

use crate::crypto::{AuthCryptoError, CipherError};

#[derive(Error, Debug)]
pub enum AidenError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate emails in upload: {}", .0.join(", "))]
    DuplicateEmails(Vec<String>),

    #[error("Emails already registered: {}", .0.join(", "))]
    ExistingEmails(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid status transition {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("External service error ({service}): {cause}")]
    ExternalService {
        service: &'static str,
        cause: String,
    },

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AidenError {
    pub fn collector(cause: impl std::fmt::Display) -> Self {
        AidenError::ExternalService {
            service: "collector",
            cause: cause.to_string(),
        }
    }

    pub fn generator(cause: impl std::fmt::Display) -> Self {
        AidenError::ExternalService {
            service: "generator",
            cause: cause.to_string(),
        }
    }
}

impl From<ModelError> for AidenError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidTransition { from, to } => {
                AidenError::InvalidTransition { from, to }
            }
            ModelError::UnknownVariant { .. } => {
                AidenError::Internal(err.to_string())
            }
        }
    }
}

impl From<CipherError> for AidenError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::Encrypt(_) | CipherError::InvalidKey(_) => {
                AidenError::Internal(err.to_string())
            }
            _ => AidenError::Decryption(err.to_string()),
        }
    }
}

impl From<AuthCryptoError> for AidenError {
    fn from(err: AuthCryptoError) -> Self {
        AidenError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AidenError>;
