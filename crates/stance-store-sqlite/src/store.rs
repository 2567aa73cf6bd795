//! [`SqliteStore`]: the SQLite implementation of [`ProfileStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;

use stance_core::{
  profile::{NewProfile, Profile, ProfileUpdate},
  store::{CreateOutcome, ProfileStore},
};

use crate::{
  encode::{PROFILE_COLUMNS, RawProfile},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A profile store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = Error;

  async fn find(&self, id: &str) -> Result<Option<Profile>> {
    let id_str = id.to_owned();

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
            rusqlite::params![id_str],
            RawProfile::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn create(&self, input: NewProfile) -> Result<CreateOutcome> {
    // The insert and the read-back share one closure, so the row returned on
    // a key collision is the one that caused it.
    let (created, raw): (bool, RawProfile) = self
      .conn
      .call(move |conn| {
        let created = match conn.execute(
          "INSERT INTO profiles (id, email, political_affiliation)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![input.id, input.email, input.political_affiliation],
        ) {
          Ok(_) => true,
          Err(e) if is_primary_key_violation(&e) => false,
          Err(e) => return Err(e.into()),
        };

        let raw = conn.query_row(
          &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
          rusqlite::params![input.id],
          RawProfile::from_row,
        )?;

        Ok((created, raw))
      })
      .await?;

    let profile = raw.into_profile()?;
    Ok(if created {
      CreateOutcome::Created(profile)
    } else {
      CreateOutcome::Exists(profile)
    })
  }

  async fn update(
    &self,
    id:     &str,
    update: ProfileUpdate,
  ) -> Result<Option<Profile>> {
    let id_str = id.to_owned();
    // `json_patch` is an RFC 7396 merge: keys absent from the patch are left
    // alone. A `null` answer removes the inner `wouldCite` member, which
    // decodes back to `None`.
    let patch = update.survey_patch()?.to_string();
    let ProfileUpdate { email, political_affiliation, .. } = update;

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "UPDATE profiles SET
                 email                 = COALESCE(?2, email),
                 political_affiliation = COALESCE(?3, political_affiliation),
                 survey                = json_patch(survey, ?4)
               WHERE id = ?1
               RETURNING {PROFILE_COLUMNS}"
            ),
            rusqlite::params![id_str, email, political_affiliation, patch],
            RawProfile::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn delete(&self, id: &str) -> Result<Option<Profile>> {
    let id_str = id.to_owned();

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("DELETE FROM profiles WHERE id = ?1 RETURNING {PROFILE_COLUMNS}"),
            rusqlite::params![id_str],
            RawProfile::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }
}
