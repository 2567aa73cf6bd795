//! Bearer-token auth gate.
//!
//! [`require_identity`] runs as middleware in front of every route. It
//! verifies the token and stores the resulting [`Identity`] in the request's
//! extensions, where handlers pick it up with `Extension<Identity>`.

use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use stance_core::{
  identity::{Identity, IdentityVerifier},
  store::ProfileStore,
};
use thiserror::Error;

use crate::{AppState, error::ApiError};

/// Why a request was refused. Logged only; callers always see a generic 403.
#[derive(Debug, Error)]
pub enum AuthError {
  #[error("missing bearer token")]
  MissingToken,

  #[error("invalid token: {0}")]
  InvalidToken(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
  let value = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(AuthError::MissingToken)?;

  let mut fields = value.split_whitespace();
  match (fields.next(), fields.next()) {
    (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => {
      Ok(token)
    }
    _ => Err(AuthError::MissingToken),
  }
}

/// Verify the request's bearer token against `verifier`.
pub async fn authenticate<V: IdentityVerifier>(
  headers:  &HeaderMap,
  verifier: &V,
) -> Result<Identity, AuthError> {
  let token = bearer_token(headers)?;
  verifier
    .verify(token)
    .await
    .map_err(|e| AuthError::InvalidToken(Box::new(e)))
}

/// Middleware: attach the verified [`Identity`] or short-circuit with 403.
pub async fn require_identity<S, V>(
  State(state): State<AppState<S, V>>,
  mut req: Request,
  next: Next,
) -> Response
where
  S: ProfileStore + 'static,
  V: IdentityVerifier + 'static,
{
  match authenticate(req.headers(), state.verifier.as_ref()).await {
    Ok(identity) => {
      tracing::debug!(uid = %identity.id, "authenticated request");
      req.extensions_mut().insert(identity);
      next.run(req).await
    }
    Err(e) => {
      tracing::warn!(error = %e, path = %req.uri().path(), "rejected request");
      ApiError::Unauthorized.into_response()
    }
  }
}
