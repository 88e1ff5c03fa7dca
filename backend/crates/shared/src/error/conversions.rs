//! Error conversions - From implementations for common error types
//!
//! Provides automatic conversion from library errors to [`AppError`] and the
//! HTTP rendering of [`AppError`] itself.

use super::app_error::AppError;

// ============================================================================
// serde_json conversions
// ============================================================================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            AppError::bad_request(format!("body contains badly-formed JSON: {err}")).with_source(err)
        } else {
            AppError::internal("JSON serialization error").with_source(err)
        }
    }
}

// ============================================================================
// SQLx conversions (feature-gated)
// ============================================================================

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::not_found("record not found").with_source(err),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                AppError::service_unavailable("database connection pool exhausted")
                    .with_source(err)
            }
            sqlx::Error::Io(_) => {
                AppError::service_unavailable("database connection error").with_source(err)
            }
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                let app_err = match db_err.code().as_deref() {
                    // Class 53: Insufficient Resources
                    Some("53000" | "53100" | "53200" | "53300") => {
                        AppError::service_unavailable("database resource exhausted")
                    }
                    // Class 57: Operator Intervention
                    Some("57P01" | "57P02" | "57P03") => {
                        AppError::service_unavailable("database unavailable")
                    }
                    _ => AppError::internal(format!("database error: {db_err}")),
                };
                app_err.with_source(err)
            }
            _ => AppError::internal(format!("database error: {err}")).with_source(err),
        }
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        use axum::extract::rejection::JsonRejection;

        let message = match &rejection {
            JsonRejection::JsonDataError(e) => format!("body contains invalid data: {}", e.body_text()),
            JsonRejection::JsonSyntaxError(_) => "body contains badly-formed JSON".to_string(),
            JsonRejection::MissingJsonContentType(_) => {
                "request must have a Content-Type of application/json".to_string()
            }
            other => other.body_text(),
        };
        AppError::bad_request(message)
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // RFC 7807 Problem Details for HTTP APIs
        let mut body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.public_message(),
        });
        if let Some(errors) = self.field_errors() {
            body["errors"] = serde_json::json!(errors);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::kind::ErrorKind;

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{\"title\":").unwrap_err();
        let app_err: AppError = json_err.into();
        assert_eq!(app_err.kind(), ErrorKind::BadRequest);
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_pool_timeout_is_unavailable() {
        let app_err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(app_err.kind(), ErrorKind::ServiceUnavailable);
    }

    #[cfg(feature = "axum")]
    #[tokio::test]
    async fn test_validation_response_lists_fields() {
        use axum::response::IntoResponse;

        let mut errors = crate::validation::FieldErrors::new();
        errors.insert("title".into(), "must be provided".into());
        let response = AppError::failed_validation(errors).into_response();
        assert_eq!(response.status().as_u16(), 422);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["errors"]["title"], "must be provided");
        assert_eq!(body["status"], 422);
    }

    #[cfg(feature = "axum")]
    #[tokio::test]
    async fn test_internal_response_hides_detail() {
        use axum::response::IntoResponse;

        let response = AppError::internal("connection reset by peer").into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("connection reset"));
    }
}
