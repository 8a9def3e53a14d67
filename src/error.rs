// src/error.rs
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

use crate::validator::FieldErrors;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    ValidationError(FieldErrors),
    /// The clinic API could not be reached or answered with an error status.
    UpstreamError(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorResponse<'a> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::ValidationError(errors) => write!(f, "Validation Error: {}", errors),
            ApiError::UpstreamError(msg) => write!(f, "Upstream Error: {}", msg),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse {
            success: false,
            message: self.to_string(),
            errors: match self {
                ApiError::ValidationError(errors) => Some(errors),
                _ => None,
            },
        };

        HttpResponse::build(self.status_code()).json(error_response)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::UpstreamError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(FieldErrors::from(&err))
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

impl ApiError {
    pub fn counter_not_found(counter: u32) -> Self {
        ApiError::NotFound(format!("Counter '{}' is not on the roster", counter))
    }

    pub fn candidate_not_found(index: usize) -> Self {
        ApiError::NotFound(format!("No patient candidate at position {}", index))
    }

    pub fn rating_out_of_range(field: &str, value: u8) -> Self {
        ApiError::BadRequest(format!(
            "{} must be between 0 and {} (got {})",
            field,
            crate::models::RATING_MAX,
            value
        ))
    }

    pub fn submission_failed(detail: impl fmt::Display) -> Self {
        ApiError::UpstreamError(format!("Feedback submission failed: {}", detail))
    }
}
