//! Handlers for `/api/profile`.
//!
//! Every handler runs behind [`crate::auth::require_identity`] and acts on
//! the caller's own profile only; the identity id is the key.

use axum::{
  Extension,
  extract::State,
  http::StatusCode,
  response::Response,
};
use serde::Deserialize;
use stance_core::{
  Error as CoreError,
  identity::{Identity, IdentityVerifier},
  profile::{NewProfile, ProfileUpdate, Survey},
  store::{CreateOutcome, ProfileStore},
};

use crate::{
  AppState,
  body::{BodyRejection, ProfileBody},
  error::ApiError,
  response::{Envelope, ErrorBody, Operation, success},
};

fn read_body<T>(
  op: Operation,
  body: Result<ProfileBody<T>, BodyRejection>,
) -> Result<T, ApiError> {
  body
    .map(|ProfileBody(b)| b)
    .map_err(|BodyRejection(reason)| ApiError::InvalidBody { op, reason })
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub political_affiliation: Option<String>,
}

/// `POST /api/profile`, body: `{"politicalAffiliation":"Independent"}` or the
/// form-encoded equivalent.
pub async fn create<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(identity): Extension<Identity>,
  body: Result<ProfileBody<CreateBody>, BodyRejection>,
) -> Result<Response, ApiError>
where
  S: ProfileStore,
  V: IdentityVerifier,
{
  let op = Operation::Create;
  let body = read_body(op, body)?;

  let candidate = NewProfile::for_identity(
    &identity,
    body.political_affiliation.unwrap_or_default(),
  );
  candidate.validate().map_err(|e| match e {
    CoreError::Validation(errors) => ApiError::Validation { op, errors },
    other => ApiError::store(op, other),
  })?;

  // Fast path only; the store's primary key is what actually guarantees a
  // single profile per identity.
  if let Some(existing) = state
    .store
    .find(&identity.id)
    .await
    .map_err(|e| ApiError::store(op, e))?
  {
    return Err(ApiError::AlreadyExists(Box::new(existing)));
  }

  match state
    .store
    .create(candidate)
    .await
    .map_err(|e| ApiError::store(op, e))?
  {
    CreateOutcome::Created(profile) => {
      tracing::info!(uid = %identity.id, "created profile");
      Ok(success(op, profile))
    }
    CreateOutcome::Exists(existing) => {
      tracing::info!(uid = %identity.id, "lost create race to a concurrent request");
      Err(ApiError::AlreadyExists(Box::new(existing)))
    }
  }
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /api/profile`
///
/// A store failure is reported as not-found, like a miss, but is logged.
pub async fn read<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(identity): Extension<Identity>,
) -> Result<Response, ApiError>
where
  S: ProfileStore,
  V: IdentityVerifier,
{
  let op = Operation::Read;
  let profile = state
    .store
    .find(&identity.id)
    .await
    .unwrap_or_else(|e| {
      tracing::error!(uid = %identity.id, error = %e, "profile lookup failed");
      None
    })
    .ok_or(ApiError::NotFound(op))?;

  Ok(success(op, profile))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
  pub email:                 Option<String>,
  pub political_affiliation: Option<String>,
  pub survey:                Option<Survey>,
}

/// `PUT /api/profile`, body: any of
/// `{"email":"…","politicalAffiliation":"…","survey":{"<key>":{"wouldCite":true}}}`
///
/// Survey keys merge into the stored map; keys not named are left alone.
pub async fn update<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(identity): Extension<Identity>,
  body: Result<ProfileBody<UpdateBody>, BodyRejection>,
) -> Result<Response, ApiError>
where
  S: ProfileStore,
  V: IdentityVerifier,
{
  let op = Operation::Update;
  let body = read_body(op, body)?;

  let update =
    ProfileUpdate::sparse(body.email, body.political_affiliation, body.survey);
  tracing::debug!(uid = %identity.id, paths = ?update.paths(), "updating profile");

  let profile = state
    .store
    .update(&identity.id, update)
    .await
    .map_err(|e| ApiError::store(op, e))?
    .ok_or(ApiError::NotFound(op))?;

  Ok(success(op, profile))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /api/profile`: responds 201 with the deleted profile.
pub async fn delete<S, V>(
  State(state): State<AppState<S, V>>,
  Extension(identity): Extension<Identity>,
) -> Result<Response, ApiError>
where
  S: ProfileStore,
  V: IdentityVerifier,
{
  let op = Operation::Delete;
  let profile = state
    .store
    .delete(&identity.id)
    .await
    .map_err(|e| ApiError::store(op, e))?
    .ok_or(ApiError::NotFound(op))?;

  tracing::info!(uid = %identity.id, "deleted profile");
  Ok(success(op, profile))
}

// ─── Fallback ─────────────────────────────────────────────────────────────────

/// Any path other than `/api/profile`. Only reachable once authenticated.
pub async fn fallback() -> Response {
  Envelope {
    message: "Not Found",
    data:    None,
    error:   Some(ErrorBody::new("not_found")),
  }
  .into_response_with(StatusCode::NOT_FOUND)
}
