//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use kernel::response::ApiResponse;
use thiserror::Error;

use crate::domain::entity::refresh_token::TokenStateError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Unknown identifier or wrong password. One message for both, so the
    /// response never reveals which identifier class missed.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Email, username, or phone already taken at registration (which
    /// one stays ambiguous)
    #[error("Email, username or phone number already exists")]
    DuplicateIdentity,

    /// Account is locked after repeated failures
    #[error("Account is locked. Try again in {minutes} minute(s)")]
    LockedOut { minutes: i64 },

    /// Contact channel not yet confirmed
    #[error("Email is not confirmed")]
    EmailNotConfirmed,

    /// Verification code missing, expired, or wrong
    #[error("Invalid or expired verification code")]
    CodeInvalid,

    /// Verification requested for an already-verified channel
    #[error("Already verified")]
    AlreadyVerified,

    /// Resend refused: unknown session, already verified, or inside the
    /// rate-limit window. One message for all three.
    #[error("Unable to resend a code right now")]
    CodeResendUnavailable,

    /// Account not found (endpoints where existence is not a secret)
    #[error("Account not found")]
    AccountNotFound,

    /// Notification dispatch failure. Propagated, never swallowed: the
    /// user must know their code never arrived.
    #[error("Failed to send verification code")]
    Delivery(String),

    /// Ephemeral store unavailable
    #[error("Service temporarily unavailable")]
    TransientStore(String),

    /// Missing/invalid/blacklisted access token
    #[error("Unauthorized")]
    Unauthorized,

    /// Refresh-token state machine violation
    #[error(transparent)]
    TokenState(#[from] TokenStateError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_)
            | AuthError::InvalidCredentials
            | AuthError::EmailNotConfirmed
            | AuthError::CodeInvalid
            | AuthError::AlreadyVerified
            | AuthError::CodeResendUnavailable => ErrorKind::BadRequest,
            AuthError::DuplicateIdentity => ErrorKind::Conflict,
            AuthError::LockedOut { .. } => ErrorKind::Locked,
            AuthError::AccountNotFound => ErrorKind::NotFound,
            AuthError::Delivery(_) => ErrorKind::ServiceUnavailable,
            AuthError::Unauthorized => ErrorKind::Unauthorized,
            AuthError::TransientStore(_)
            | AuthError::TokenState(_)
            | AuthError::Database(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// User-facing message. Internal detail stays in logs.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Delivery(_) => "Failed to send verification code".to_string(),
            AuthError::TransientStore(_)
            | AuthError::TokenState(_)
            | AuthError::Database(_)
            | AuthError::Internal(_) => "Something went wrong".to_string(),
            other => other.to_string(),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::TransientStore(detail) => {
                tracing::error!(detail = %detail, "Ephemeral store error");
            }
            AuthError::Delivery(detail) => {
                tracing::error!(detail = %detail, "Notification dispatch failed");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::TokenState(e) => {
                tracing::error!(error = %e, "Refresh token state violation surfaced");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::LockedOut { minutes } => {
                tracing::warn!(remaining_minutes = minutes, "Login attempt on locked account");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        let body = ApiResponse::<()>::failure(status.as_u16(), self.public_message());
        (status, axum::Json(body)).into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest | ErrorKind::UnprocessableEntity => {
                AuthError::Validation(err.message().to_string())
            }
            _ => AuthError::Internal(err.to_string()),
        }
    }
}
