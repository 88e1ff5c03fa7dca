//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum that maps to HTTP status codes and to the
//! fixed, client-safe message each status carries.

use serde::Serialize;

/// エラー種別の列挙体
///
/// API が返しうるステータスの分類です。サーバー側の種別（5xx）は
/// 詳細を隠し、[`ErrorKind::public_message`] のみをクライアントへ返します。
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::Conflict;
/// assert_eq!(kind.status_code(), 409);
/// assert_eq!(kind.as_str(), "Conflict");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// 400 - リクエストボディやパラメータが解釈できない
    BadRequest,
    /// 401 - トークンが無い、不正、または期限切れ
    Unauthorized,
    /// 403 - 認証済みだが権限が無い
    Forbidden,
    /// 404 - リソースが存在しない
    NotFound,
    /// 405 - メソッド非対応
    MethodNotAllowed,
    /// 409 - バージョン不一致による編集競合
    Conflict,
    /// 422 - フィールド検証エラー
    UnprocessableEntity,
    /// 429 - レート制限超過
    TooManyRequests,
    /// 500 - 予期しない内部エラー
    InternalServerError,
    /// 503 - データベース等が一時的に利用不可
    ServiceUnavailable,
}

impl ErrorKind {
    /// HTTP ステータスコードを取得
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::Conflict => 409,
            ErrorKind::UnprocessableEntity => 422,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::InternalServerError => 500,
            ErrorKind::ServiceUnavailable => 503,
        }
    }

    /// HTTP の理由フレーズ
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::MethodNotAllowed => "Method Not Allowed",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::UnprocessableEntity => "Unprocessable Entity",
            ErrorKind::TooManyRequests => "Too Many Requests",
            ErrorKind::InternalServerError => "Internal Server Error",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// クライアントに返す既定メッセージ
    ///
    /// サーバーエラーではこのメッセージだけが外部に出ます。
    pub const fn public_message(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "the request could not be understood",
            ErrorKind::Unauthorized => "invalid or missing authentication token",
            ErrorKind::Forbidden => {
                "your user account doesn't have the necessary permissions to access this resource"
            }
            ErrorKind::NotFound => "the requested resource could not be found",
            ErrorKind::MethodNotAllowed => "the method is not supported for this resource",
            ErrorKind::Conflict => {
                "unable to update the record due to an edit conflict, please try again"
            }
            ErrorKind::UnprocessableEntity => "the request contains invalid fields",
            ErrorKind::TooManyRequests => "rate limit exceeded",
            ErrorKind::InternalServerError => {
                "the server encountered a problem and could not process your request"
            }
            ErrorKind::ServiceUnavailable => {
                "the server is temporarily unable to process your request"
            }
        }
    }

    /// サーバー側のエラーかどうか（5xx はログに記録する）
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// クライアント側のエラーかどうか
    #[inline]
    pub const fn is_client_error(&self) -> bool {
        let code = self.status_code();
        code >= 400 && code < 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::BadRequest.status_code(), 400);
        assert_eq!(ErrorKind::Unauthorized.status_code(), 401);
        assert_eq!(ErrorKind::Forbidden.status_code(), 403);
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::MethodNotAllowed.status_code(), 405);
        assert_eq!(ErrorKind::Conflict.status_code(), 409);
        assert_eq!(ErrorKind::UnprocessableEntity.status_code(), 422);
        assert_eq!(ErrorKind::TooManyRequests.status_code(), 429);
        assert_eq!(ErrorKind::InternalServerError.status_code(), 500);
        assert_eq!(ErrorKind::ServiceUnavailable.status_code(), 503);
    }

    #[test]
    fn test_server_and_client_split() {
        assert!(!ErrorKind::Conflict.is_server_error());
        assert!(ErrorKind::Conflict.is_client_error());
        assert!(ErrorKind::InternalServerError.is_server_error());
        assert!(!ErrorKind::ServiceUnavailable.is_client_error());
    }

    #[test]
    fn test_public_messages_do_not_name_permissions() {
        let message = ErrorKind::Forbidden.public_message();
        assert!(!message.contains("movies:"));
        assert!(ErrorKind::InternalServerError
            .public_message()
            .starts_with("the server encountered a problem"));
    }
}
