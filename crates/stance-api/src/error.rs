//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Causes from the store are logged here and replaced by their kind in the
//! response body.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use stance_core::{error::ValidationErrors, profile::Profile};
use thiserror::Error;

use crate::response::{Envelope, ErrorBody, Operation};

/// An error returned by the auth gate or a profile handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("invalid request body: {reason}")]
  InvalidBody { op: Operation, reason: String },

  #[error("validation failed: {errors}")]
  Validation { op: Operation, errors: ValidationErrors },

  /// Carries the record that already exists so the caller can see it.
  #[error("profile already exists")]
  AlreadyExists(Box<Profile>),

  #[error("profile not found")]
  NotFound(Operation),

  #[error("store error: {source}")]
  Store {
    op:     Operation,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  pub fn store<E>(op: Operation, source: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store { op, source: Box::new(source) }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, envelope) = match self {
      ApiError::Unauthorized => {
        return (StatusCode::FORBIDDEN, Json(json!({ "message": "Unauthorized" })))
          .into_response();
      }
      ApiError::InvalidBody { op, reason } => (
        StatusCode::BAD_REQUEST,
        Envelope {
          message: op.failure_message(),
          data:    None,
          error:   Some(ErrorBody::new("invalid_body").with_detail(reason)),
        },
      ),
      ApiError::Validation { op, errors } => (
        StatusCode::BAD_REQUEST,
        Envelope {
          message: op.failure_message(),
          data:    None,
          error:   Some(ErrorBody::new("validation").with_fields(errors)),
        },
      ),
      ApiError::AlreadyExists(existing) => (
        StatusCode::BAD_REQUEST,
        Envelope {
          message: Operation::Create.failure_message(),
          data:    Some((*existing).into()),
          error:   Some(
            ErrorBody::new("already_exists").with_detail("Profile already exists!"),
          ),
        },
      ),
      ApiError::NotFound(op) => (
        StatusCode::NOT_FOUND,
        Envelope {
          message: op.failure_message(),
          data:    None,
          error:   Some(ErrorBody::new("not_found")),
        },
      ),
      ApiError::Store { op, source } => {
        tracing::error!(operation = ?op, error = %source, "profile store failure");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Envelope {
            message: op.failure_message(),
            data:    None,
            error:   Some(ErrorBody::new("internal")),
          },
        )
      }
    };
    envelope.into_response_with(status)
  }
}
