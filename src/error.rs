use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Error body sent to clients.
///
/// `errors` carries a field-level detail map when the failure came out of
/// payload validation; it is omitted from the JSON otherwise.
///
/// ```json
/// {
///   "status": "fail",
///   "message": "Validation failed",
///   "errors": { "score": [{ "code": "range", ... }] }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Canonical client-facing messages, one place to change them.
#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    // Authentication
    InvalidToken,
    TokenNotProvided,
    InvalidConfirmationCode,

    // Authorization
    PermissionDenied,

    // Lookup
    UserNoLongerExist,

    // Else
    ServerError,
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorMessage::InvalidToken => "Token is invalid or expired".to_string(),
            ErrorMessage::TokenNotProvided => {
                "Authentication credentials were not provided".to_string()
            }
            ErrorMessage::InvalidConfirmationCode => "Confirmation code is invalid".to_string(),
            ErrorMessage::PermissionDenied => {
                "You are not allowed to perform this action".to_string()
            }
            ErrorMessage::UserNoLongerExist => {
                "User belonging to this token no longer exists".to_string()
            }
            ErrorMessage::ServerError => "Server Error. Please try again later".to_string(),
        };
        write!(f, "{}", message)
    }
}

/// Internal error type returned by handlers and middleware; axum converts it
/// into a JSON response via `IntoResponse`.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
    pub errors: Option<Value>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        HttpError {
            message: message.into(),
            status,
            errors: None,
        }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    /// 400 with the field-level detail map from `validator`.
    pub fn validation(errors: validator::ValidationErrors) -> Self {
        HttpError {
            message: "Validation failed".to_string(),
            status: StatusCode::BAD_REQUEST,
            errors: serde_json::to_value(&errors).ok(),
        }
    }

    /// 409 for store-level uniqueness violations (duplicate review, slug,
    /// username, email).
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::CONFLICT)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::UNAUTHORIZED)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::FORBIDDEN)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND)
    }

    pub fn into_http_response(self) -> Response {
        let json_response = Json(ErrorResponse {
            status: "fail".to_string(),
            message: self.message.clone(),
            errors: self.errors,
        });

        (self.status, json_response).into_response()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

/// Map a sqlx error onto the taxonomy: unique violations become conflicts,
/// missing rows 404, anything else a logged 500.
pub fn from_sqlx(e: sqlx::Error) -> HttpError {
    match &e {
        sqlx::Error::RowNotFound => HttpError::not_found("Not found"),
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            HttpError::conflict(db_err.to_string())
        }
        _ => {
            tracing::error!("DB error: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        }
    }
}
