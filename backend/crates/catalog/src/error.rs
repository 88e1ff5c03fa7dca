//! Catalog Error Types
//!
//! Store outcomes for movies, modules and departments, mapped onto the
//! unified `kernel::error::AppError` responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use kernel::validation::{FieldErrors, Validator};
use platform::store::StoreError;
use thiserror::Error;

use crate::domain::resource::Resource;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Field-level validation failures
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("the requested resource could not be found")]
    NotFound,

    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    #[error("store error: {0}")]
    Store(StoreError),
}

impl CatalogError {
    pub fn field(key: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(key.to_string(), message.to_string());
        CatalogError::Validation(errors)
    }

    /// Like `From<StoreError>`, but turns `E`'s foreign keys into field errors
    pub fn from_store<E: Resource>(err: StoreError) -> Self {
        match err {
            StoreError::ForeignKey { ref constraint } => match E::reference_error(constraint) {
                Some((key, message)) => CatalogError::field(key, message),
                None => CatalogError::Store(err),
            },
            other => other.into(),
        }
    }

    /// `Ok(())` when `v` recorded nothing
    pub(crate) fn check(v: Validator) -> CatalogResult<()> {
        if v.valid() {
            Ok(())
        } else {
            Err(CatalogError::Validation(v.errors().clone()))
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(_) => ErrorKind::UnprocessableEntity,
            CatalogError::NotFound => ErrorKind::NotFound,
            CatalogError::EditConflict => ErrorKind::Conflict,
            CatalogError::Store(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            CatalogError::Validation(errors) => AppError::failed_validation(errors.clone()),
            CatalogError::Store(_) => AppError::from_kind(self.kind()),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    pub(crate) fn log(&self) {
        match self {
            CatalogError::Store(e) => {
                tracing::error!(error = %e, "Catalog store error");
            }
            _ => {
                tracing::debug!(error = %self, "Catalog error");
            }
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => CatalogError::NotFound,
            StoreError::EditConflict => CatalogError::EditConflict,
            other => CatalogError::Store(other),
        }
    }
}
