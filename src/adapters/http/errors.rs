use actix_web::{
  HttpResponse,
  error::ResponseError,
  http::{StatusCode, header::ContentType},
};
use serde::Serialize;
use std::fmt;

use crate::domain::bill::BillError;

use super::dtos::ErrorResponse;

/// API error type that maps domain errors to HTTP responses
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum ApiError {
  /// Validation error (400 Bad Request)
  Validation(String),

  /// Missing bill (404 Not Found)
  NotFound(String),

  /// Duplicate reference or misrouted line (409 Conflict)
  Conflict(String),

  /// Internal server error (500 Internal Server Error)
  Internal(String),
}

impl fmt::Display for ApiError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
      ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
      ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
      ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
    }
  }
}

impl ResponseError for ApiError {
  fn status_code(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) => StatusCode::BAD_REQUEST,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    let (error_type, message) = match self {
      ApiError::Validation(msg) => ("validation_error", msg.clone()),
      ApiError::NotFound(msg) => ("not_found", msg.clone()),
      ApiError::Conflict(msg) => ("conflict", msg.clone()),
      ApiError::Internal(msg) => {
        // Don't expose internal error details
        tracing::error!("Internal error: {}", msg);
        (
          "internal_error",
          "An internal server error occurred".to_string(),
        )
      }
    };

    let error_response = ErrorResponse {
      error: error_type.to_string(),
      message,
      details: None,
    };

    HttpResponse::build(status)
      .content_type(ContentType::json())
      .json(error_response)
  }
}

impl From<BillError> for ApiError {
  fn from(error: BillError) -> Self {
    match error {
      BillError::Validation(e) => ApiError::Validation(e.to_string()),
      BillError::NotFound(_) | BillError::BillNotFound(_) => ApiError::NotFound(error.to_string()),
      BillError::ReferenceAlreadyExists(_) | BillError::LineOwnerMismatch { .. } => {
        ApiError::Conflict(error.to_string())
      }
      BillError::Rendering(_) | BillError::PdfGenerationFailed(_) | BillError::Database(_) => {
        ApiError::Internal(error.to_string())
      }
    }
  }
}

/// Convert validation errors from validator crate
impl From<validator::ValidationErrors> for ApiError {
  fn from(errors: validator::ValidationErrors) -> Self {
    let mut messages: Vec<String> = errors
      .field_errors()
      .iter()
      .flat_map(|(field, errors)| {
        errors
          .iter()
          .map(|error| {
            error
              .message
              .as_ref()
              .map(|m| m.to_string())
              .unwrap_or_else(|| format!("Invalid field: {}", field))
          })
          .collect::<Vec<_>>()
      })
      .collect();
    // field_errors() is a HashMap
    messages.sort();

    ApiError::Validation(messages.join(", "))
  }
}
