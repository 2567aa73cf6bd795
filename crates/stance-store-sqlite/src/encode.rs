//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! The survey map is stored as a compact JSON object.

use stance_core::profile::{Profile, Survey};

use crate::Result;

/// Columns selected (or returned) for a full profile row, in [`RawProfile`]
/// field order.
pub const PROFILE_COLUMNS: &str = "id, email, political_affiliation, survey";

pub fn decode_survey(s: &str) -> Result<Survey> { Ok(serde_json::from_str(s)?) }

/// A profile row as read from SQLite, before JSON decoding.
pub struct RawProfile {
  pub id:                    String,
  pub email:                 String,
  pub political_affiliation: String,
  pub survey:                String,
}

impl RawProfile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                    row.get(0)?,
      email:                 row.get(1)?,
      political_affiliation: row.get(2)?,
      survey:                row.get(3)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:                    self.id,
      email:                 self.email,
      political_affiliation: self.political_affiliation,
      survey:                decode_survey(&self.survey)?,
    })
  }
}
