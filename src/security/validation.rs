//! Request Validation Module
//!
//! Field checks and input sanitization shared by the API handlers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::error::AppError;

static PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\d{10,15}$").expect("valid phone regex"));

/// Validation error types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField { field: String },

    #[error("Field '{field}' is too long (max: {max}, got: {got})")]
    TooLong {
        field: String,
        max: usize,
        got: usize,
    },

    #[error("Field '{field}' is too short (min: {min}, got: {got})")]
    TooShort {
        field: String,
        min: usize,
        got: usize,
    },

    #[error("Field '{field}' is not a valid phone number: {value}")]
    InvalidPhone { field: String, value: String },

    #[error("Field '{field}' is not a valid ISO-8601 date: {value}")]
    InvalidDateTime { field: String, value: String },

    #[error("Field '{field}' is below minimum value: min={min}, got={got}")]
    BelowMin { field: String, min: i64, got: i64 },

    #[error("{message}")]
    Custom { field: String, message: String },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field }
            | Self::TooLong { field, .. }
            | Self::TooShort { field, .. }
            | Self::InvalidPhone { field, .. }
            | Self::InvalidDateTime { field, .. }
            | Self::BelowMin { field, .. }
            | Self::Custom { field, .. } => field.as_str(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Validation result type
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Request validator implementation
pub struct RequestValidator;

impl RequestValidator {
    /// Trimmed value of a required field; blank counts as missing.
    pub fn required<'a>(field: &str, value: Option<&'a str>) -> ValidationResult<&'a str> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(ValidationError::MissingField {
                field: field.to_string(),
            }),
        }
    }

    /// Validate field length in characters
    pub fn validate_length(
        field: &str,
        value: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> ValidationResult<()> {
        let length = value.chars().count();

        if let Some(min_len) = min {
            if length < min_len {
                return Err(ValidationError::TooShort {
                    field: field.to_string(),
                    min: min_len,
                    got: length,
                });
            }
        }

        if let Some(max_len) = max {
            if length > max_len {
                return Err(ValidationError::TooLong {
                    field: field.to_string(),
                    max: max_len,
                    got: length,
                });
            }
        }

        Ok(())
    }

    /// `+` followed by 10 to 15 digits
    pub fn validate_phone(field: &str, value: &str) -> ValidationResult<()> {
        if PHONE_NUMBER.is_match(value) {
            Ok(())
        } else {
            Err(ValidationError::InvalidPhone {
                field: field.to_string(),
                value: value.to_string(),
            })
        }
    }

    /// Parse an ISO-8601 date or date-time.
    ///
    /// Values without an offset are taken as UTC; a bare date means midnight.
    pub fn parse_datetime(field: &str, value: &str) -> ValidationResult<DateTime<Utc>> {
        let value = value.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Ok(dt.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
                return Ok(naive.and_utc());
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
        }
        Err(ValidationError::InvalidDateTime {
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    /// Page number and size, both at least 1; size capped at `max_per_page`.
    pub fn validate_pagination(
        page: Option<u64>,
        per_page: Option<u64>,
        max_per_page: u64,
    ) -> ValidationResult<(u64, u64)> {
        let page = page.unwrap_or(1);
        let per_page = per_page.unwrap_or(20);
        if page < 1 {
            return Err(ValidationError::BelowMin {
                field: "page".to_string(),
                min: 1,
                got: page as i64,
            });
        }
        if per_page < 1 {
            return Err(ValidationError::BelowMin {
                field: "per_page".to_string(),
                min: 1,
                got: per_page as i64,
            });
        }
        Ok((page, per_page.min(max_per_page)))
    }

    /// Trim and drop control characters other than whitespace.
    pub fn sanitize_string(input: &str) -> String {
        input
            .trim()
            .chars()
            .filter(|c| !c.is_control() || c.is_whitespace())
            .collect()
    }
}
