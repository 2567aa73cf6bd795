//! The JSON envelope every response is wrapped in.
//!
//! ```json
//! { "message": "…", "data": { … }, "error": { "kind": "…" } }
//! ```

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use stance_core::{
  error::ValidationErrors,
  profile::{Profile, Survey},
};

/// The verb a handler is serving; selects messages and the success status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
  Create,
  Read,
  Update,
  Delete,
}

impl Operation {
  pub fn success_message(self) -> &'static str {
    match self {
      Self::Create => "Successfully created profile!",
      Self::Read => "Successfully retrieved profile!",
      Self::Update => "Successfully updated profile!",
      Self::Delete => "Successfully deleted profile!",
    }
  }

  pub fn failure_message(self) -> &'static str {
    match self {
      Self::Create => "Failed to create profile!",
      Self::Read => "Failed to retrieve profile!",
      Self::Update => "Failed to update profile!",
      Self::Delete => "Failed to delete profile!",
    }
  }

  pub fn success_status(self) -> StatusCode {
    match self {
      Self::Delete => StatusCode::CREATED,
      _ => StatusCode::OK,
    }
  }
}

/// The public view of a profile. The identity id is never echoed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
  pub email:                 String,
  pub political_affiliation: String,
  #[serde(skip_serializing_if = "Survey::is_empty")]
  pub survey:                Survey,
}

impl From<Profile> for ProfileData {
  fn from(p: Profile) -> Self {
    Self {
      email:                 p.email,
      political_affiliation: p.political_affiliation,
      survey:                p.survey,
    }
  }
}

/// Public error detail: the kind, never the underlying cause.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
  pub kind:   &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub detail: Option<String>,
  #[serde(skip_serializing_if = "ValidationErrors::is_empty")]
  pub fields: ValidationErrors,
}

impl ErrorBody {
  pub fn new(kind: &'static str) -> Self {
    Self { kind, detail: None, fields: ValidationErrors::default() }
  }

  pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
    self.detail = Some(detail.into());
    self
  }

  pub fn with_fields(mut self, fields: ValidationErrors) -> Self {
    self.fields = fields;
    self
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
  pub message: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data:    Option<ProfileData>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:   Option<ErrorBody>,
}

impl Envelope {
  pub fn into_response_with(self, status: StatusCode) -> Response {
    (status, Json(self)).into_response()
  }
}

/// A successful response for `op` carrying `profile`.
pub fn success(op: Operation, profile: Profile) -> Response {
  Envelope {
    message: op.success_message(),
    data:    Some(profile.into()),
    error:   None,
  }
  .into_response_with(op.success_status())
}
