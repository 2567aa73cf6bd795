//! Error types for `stance-core`.

use serde::Serialize;
use thiserror::Error;

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   &'static str,
  pub message: String,
}

/// Every field that failed validation, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub(crate) fn required(&mut self, field: &'static str) {
    self.0.push(FieldError {
      field,
      message: format!("{field} is required"),
    });
  }
}

impl std::fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let messages: Vec<&str> =
      self.0.iter().map(|e| e.message.as_str()).collect();
    f.write_str(&messages.join(", "))
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
