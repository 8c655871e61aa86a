// src/error.rs

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use encore_auth_api::ErrorResponse;

use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::db::error::RepositoryError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    // === Erreurs du moteur d'identité ===
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Invalid email or password")]
    BadCredentials,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    // === Erreurs d'Authentification ===
    #[error("Email already exists")]
    UserAlreadyExists,
    #[error("Password too weak: {0}")]
    WeakPassword(String),
    #[error("Password and confirmation do not match")]
    PasswordMismatch,
    #[error("Reset token is invalid or expired")]
    InvalidResetToken,
    #[error("Invalid token format")]
    InvalidTokenFormat,
    #[error("Unauthorized: {0}")]
    UnauthorizedAction(String),

    // === Erreurs de Hashing/Cryptographie ===
    #[error("Password hashing failed: {0}")]
    PasswordHashingFailed(String),
    #[error("Token generation failed: {0}")]
    TokenGenerationFailed(String),

    // === Erreurs d'entrée ===
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        // Le détail technique reste dans les logs
        if let Some(detail) = self.internal_detail() {
            tracing::error!(error_code = code, %status, detail, "Request failed");
        }

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.public_message(),
            details: None,
        });

        (status, body).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UserAlreadyExists => StatusCode::CONFLICT,
            AppError::BadCredentials | AppError::UnauthorizedAction(_) => StatusCode::UNAUTHORIZED,
            AppError::ValidationError(_)
            | AppError::WeakPassword(_)
            | AppError::PasswordMismatch
            | AppError::InvalidResetToken
            | AppError::InvalidTokenFormat
            | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::PersistenceError(_)
            | AppError::PasswordHashingFailed(_)
            | AppError::TokenGenerationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Code stable exposé aux clients dans `ErrorResponse::error`
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::UserAlreadyExists => "USER_EXISTS",
            AppError::BadCredentials => "INVALID_CREDENTIALS",
            AppError::UnauthorizedAction(_) => "UNAUTHORIZED",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::WeakPassword(_) => "WEAK_PASSWORD",
            AppError::PasswordMismatch => "PASSWORD_MISMATCH",
            AppError::InvalidResetToken => "INVALID_RESET_TOKEN",
            AppError::InvalidTokenFormat => "INVALID_TOKEN_FORMAT",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::PersistenceError(_) => "DATABASE_ERROR",
            AppError::PasswordHashingFailed(_) => "HASHING_ERROR",
            AppError::TokenGenerationFailed(_) => "TOKEN_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::PersistenceError(_) => "An error occurred with the database".to_string(),
            AppError::PasswordHashingFailed(_) => {
                "An error occurred while processing your request".to_string()
            }
            AppError::TokenGenerationFailed(_) => {
                "An error occurred while generating token".to_string()
            }
            AppError::NotFound(msg)
            | AppError::UnauthorizedAction(msg)
            | AppError::ValidationError(msg)
            | AppError::WeakPassword(msg)
            | AppError::InvalidInput(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    fn internal_detail(&self) -> Option<&str> {
        match self {
            AppError::PersistenceError(detail)
            | AppError::PasswordHashingFailed(detail)
            | AppError::TokenGenerationFailed(detail) => Some(detail),
            _ => None,
        }
    }

    // === Constructeurs helpers ===
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        AppError::PersistenceError(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AppError::InvalidInput(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::UnauthorizedAction(msg.into())
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::not_found(msg),
            other => AppError::persistence(other.to_string()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::PasswordHashingFailed(err.to_string())
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::GenerationFailed(e) => AppError::TokenGenerationFailed(e.to_string()),
            JwtError::VerificationFailed(_) => AppError::unauthorized("Invalid token"),
        }
    }
}

// Corps JSON absent ou illisible
impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::invalid_input(format!("Invalid JSON: {err}"))
    }
}
