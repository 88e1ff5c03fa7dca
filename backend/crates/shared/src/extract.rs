//! Request extractors whose rejections render as [`AppError`].

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::app_error::AppError;

/// JSON body extractor and responder.
///
/// Behaves like [`axum::Json`] but malformed bodies become a problem-details
/// 400 instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl<T> IntoResponse for AppJson<T>
where
    axum::Json<T>: IntoResponse,
    T: Serialize,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Header carrying the version a client last saw
pub const EXPECTED_VERSION_HEADER: &str = "x-expected-version";

/// Optional `X-Expected-Version` precondition for updates.
///
/// Absent header means "no precondition". Anything other than a positive
/// integer is rejected with 400.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpectedVersion(pub Option<i32>);

impl ExpectedVersion {
    /// True when there is no precondition or it equals `current`.
    pub fn matches(&self, current: i32) -> bool {
        self.0.is_none_or(|expected| expected == current)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ExpectedVersion {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(EXPECTED_VERSION_HEADER) else {
            return Ok(Self(None));
        };

        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i32>().ok())
            .filter(|v| *v >= 1)
            .map(|v| Self(Some(v)))
            .ok_or_else(|| {
                AppError::bad_request("the X-Expected-Version header must be a positive integer")
            })
    }
}
