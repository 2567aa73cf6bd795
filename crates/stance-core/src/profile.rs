//! Profile types: the single record each identity owns.
//!
//! A profile is created once per identity, updated field-by-field, and
//! deleted without a tombstone. Survey answers merge per key: an update only
//! ever touches the keys it names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  error::ValidationErrors,
  identity::Identity,
};

// ─── Survey ──────────────────────────────────────────────────────────────────

/// One survey answer. `would_cite` is `None` until the caller answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyEntry {
  #[serde(default)]
  pub would_cite: Option<bool>,
}

impl SurveyEntry {
  pub fn answered(would_cite: bool) -> Self {
    Self { would_cite: Some(would_cite) }
  }
}

/// Survey answers keyed by an open-ended, caller-chosen key.
pub type Survey = BTreeMap<String, SurveyEntry>;

// ─── Profile ─────────────────────────────────────────────────────────────────

/// A persisted profile. `id` is the owning identity's id and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
  pub id:                    String,
  pub email:                 String,
  pub political_affiliation: String,
  pub survey:                Survey,
}

// ─── NewProfile ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::ProfileStore::create`].
///
/// Profiles are born without survey answers; those arrive through updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
  pub id:                    String,
  pub email:                 String,
  pub political_affiliation: String,
}

impl NewProfile {
  /// Candidate profile for `identity`, copying its id and email.
  pub fn for_identity(
    identity: &Identity,
    political_affiliation: impl Into<String>,
  ) -> Self {
    Self {
      id:                    identity.id.clone(),
      email:                 identity.email.clone(),
      political_affiliation: political_affiliation.into(),
    }
  }

  /// Check that every required field is non-empty.
  ///
  /// All offending fields are reported, not only the first.
  pub fn validate(&self) -> Result<()> {
    let mut errors = ValidationErrors::default();
    if self.id.is_empty() {
      errors.required("id");
    }
    if self.email.is_empty() {
      errors.required("email");
    }
    if self.political_affiliation.is_empty() {
      errors.required("politicalAffiliation");
    }

    if errors.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation(errors))
    }
  }
}

// ─── ProfileUpdate ───────────────────────────────────────────────────────────

/// A sparse, merge-style update.
///
/// The updatable fields are exactly those below. `None` leaves a top-level
/// field untouched; each `survey` entry overwrites only its own key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
  pub email:                 Option<String>,
  pub political_affiliation: Option<String>,
  pub survey:                Survey,
}

impl ProfileUpdate {
  /// Build an update from optional request fields.
  ///
  /// Empty strings are treated as absent, so an update can never blank out a
  /// required field.
  pub fn sparse(
    email: Option<String>,
    political_affiliation: Option<String>,
    survey: Option<Survey>,
  ) -> Self {
    Self {
      email:                 email.filter(|s| !s.is_empty()),
      political_affiliation: political_affiliation.filter(|s| !s.is_empty()),
      survey:                survey.unwrap_or_default(),
    }
  }

  /// The survey entries as a JSON object keyed by survey key, for stores that
  /// merge documents natively.
  pub fn survey_patch(&self) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(&self.survey)?)
  }

  /// Dotted field paths this update touches, e.g. `survey.climate`.
  pub fn paths(&self) -> Vec<String> {
    let mut paths = Vec::new();
    if self.email.is_some() {
      paths.push("email".to_owned());
    }
    if self.political_affiliation.is_some() {
      paths.push("politicalAffiliation".to_owned());
    }
    paths.extend(self.survey.keys().map(|k| format!("survey.{k}")));
    paths
  }
}
