//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use kernel::validation::FieldErrors;
use platform::password::PasswordHashError;
use platform::store::StoreError;
use thiserror::Error;

/// Name of the unique index on `users.email`
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Field-level validation failures
    #[error("validation failed")]
    Validation(FieldErrors),

    /// Email already registered
    #[error("a user with this email address already exists")]
    DuplicateEmail,

    /// Wrong email or password
    #[error("invalid authentication credentials")]
    InvalidCredentials,

    /// Malformed, unknown or expired bearer token
    #[error("invalid or missing authentication token")]
    InvalidAuthToken,

    /// Anonymous request to a protected route
    #[error("you must be authenticated to access this resource")]
    AuthenticationRequired,

    #[error("your user account must be activated to access this resource")]
    InactiveAccount,

    /// Missing permission or role
    #[error("your user account doesn't have the necessary permissions to access this resource")]
    NotPermitted,

    #[error("the requested resource could not be found")]
    UserNotFound,

    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    #[error("password hashing error: {0}")]
    Password(#[from] PasswordHashError),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("mail delivery failed: {0}")]
    Mail(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Single-field validation failure
    pub fn field(key: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(key.to_string(), message.to_string());
        AuthError::Validation(errors)
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) | AuthError::DuplicateEmail => ErrorKind::UnprocessableEntity,
            AuthError::InvalidCredentials
            | AuthError::InvalidAuthToken
            | AuthError::AuthenticationRequired => ErrorKind::Unauthorized,
            AuthError::InactiveAccount | AuthError::NotPermitted => ErrorKind::Forbidden,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::EditConflict => ErrorKind::Conflict,
            AuthError::Password(_)
            | AuthError::Store(_)
            | AuthError::Mail(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::Validation(errors) => AppError::failed_validation(errors.clone()),
            AuthError::DuplicateEmail => {
                let mut errors = FieldErrors::new();
                errors.insert("email".into(), self.to_string());
                AppError::failed_validation(errors)
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            AuthError::Password(e) => {
                tracing::error!(error = %e, "Auth password hashing error");
            }
            AuthError::Store(e) => {
                tracing::error!(error = %e, "Auth store error");
            }
            AuthError::Mail(msg) | AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidAuthToken => {
                tracing::warn!("Invalid bearer token presented");
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
        let mut response = self.to_app_error().into_response();
        if matches!(self, AuthError::InvalidAuthToken) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AuthError::UserNotFound,
            StoreError::EditConflict => AuthError::EditConflict,
            StoreError::DuplicateKey { ref constraint } if constraint == USERS_EMAIL_KEY => {
                AuthError::DuplicateEmail
            }
            other => AuthError::Store(other),
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::from(err).into()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.field_errors() {
            Some(errors) => AuthError::Validation(errors.clone()),
            None => AuthError::Internal(err.to_string()),
        }
    }
}
