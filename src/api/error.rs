// HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::error::AppError;

#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub status_code: StatusCode,
    pub error_code: Option<String>,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            error_code: Some("INTERNAL_ERROR".to_string()),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::BAD_REQUEST,
            error_code: Some("BAD_REQUEST".to_string()),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::NOT_FOUND,
            error_code: Some("NOT_FOUND".to_string()),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::UNAUTHORIZED,
            error_code: Some("UNAUTHORIZED".to_string()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response_json = json!({
            "error": true,
            "message": self.message,
            "status": self.status_code.as_u16()
        });

        if let Some(error_code) = self.error_code {
            response_json["error_code"] = json!(error_code);
        }

        (self.status_code, Json(response_json)).into_response()
    }
}

/// Store and internal failures are logged here and reported without detail.
impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(message) => ApiError::bad_request(message),
            AppError::NotFound(what) => ApiError::not_found(format!("{what} not found")),
            other => {
                tracing::error!("Request failed: {}", other);
                ApiError::internal("Internal server error")
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub trait IntoApiErrorOption<T> {
    fn ok_or_not_found(self, what: &str) -> Result<T, ApiError>;
}

impl<T> IntoApiErrorOption<T> for Option<T> {
    fn ok_or_not_found(self, what: &str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(format!("{what} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_taxonomy_to_status_codes() {
        let bad: ApiError = AppError::validation("Author is required").into();
        assert_eq!(bad.status_code, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "Author is required");

        let missing: ApiError = AppError::not_found("Article").into();
        assert_eq!(missing.status_code, StatusCode::NOT_FOUND);

        let broken: ApiError = AppError::Config("boom".into()).into();
        assert_eq!(broken.status_code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(broken.message, "Internal server error");
    }

    #[test]
    fn missing_option_becomes_404() {
        let err = None::<u8>.ok_or_not_found("Quote").unwrap_err();
        assert_eq!(err.status_code, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Quote not found");
    }
}
