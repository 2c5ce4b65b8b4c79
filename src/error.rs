//! Error handling
//!
//! Application error type and its mapping onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error
#[derive(Error, Debug)]
pub enum AppError {
    /// Storage backend failure
    #[error("Database error: {0}")]
    Database(String),

    /// Missing or invalid credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request parameters
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unique constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests, try again later")]
    RateLimited,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SMS provider rejected the request or could not be reached
    #[error("SMS error: {0}")]
    Sms(String),

    /// No SMS provider credentials configured
    #[error("SMS provider not configured")]
    SmsUnavailable,

    /// Intent corpus could not be loaded
    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

#[cfg(feature = "surrealdb")]
impl From<surrealdb::Error> for AppError {
    fn from(e: surrealdb::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Sms(e.to_string())
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        if status >= 500 {
            tracing::error!(error = %self, "Request failed");
        }
        let body = Json(ErrorResponse::new(&code, &self.to_string()));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            request_id: None,
        }
    }

    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }

    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }
}

/// HTTP status mapping
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::NotFound(_) => (404, "NOT_FOUND".to_string()),
            AppError::Authentication(_) => (401, "UNAUTHORIZED".to_string()),
            AppError::Authorization(_) => (403, "FORBIDDEN".to_string()),
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::Conflict(_) => (409, "CONFLICT".to_string()),
            AppError::RateLimited => (429, "RATE_LIMITED".to_string()),
            AppError::SmsUnavailable => (503, "SMS_UNAVAILABLE".to_string()),
            AppError::Sms(_) => (502, "SMS_ERROR".to_string()),
            AppError::Database(_) => (500, "INTERNAL_ERROR".to_string()),
            AppError::Corpus(_) => (500, "CORPUS_ERROR".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Validation("x".into()), 400),
            (AppError::Authentication("x".into()), 401),
            (AppError::Authorization("x".into()), 403),
            (AppError::NotFound("x".into()), 404),
            (AppError::Conflict("x".into()), 409),
            (AppError::RateLimited, 429),
            (AppError::SmsUnavailable, 503),
            (AppError::Internal("x".into()), 500),
        ];
        for (err, expected) in cases {
            let (status, _): (u16, String) = (&err).into();
            assert_eq!(status, expected, "{err}");
        }
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::NotFound("reminder 42".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
