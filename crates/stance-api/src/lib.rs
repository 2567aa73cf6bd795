//! JSON profile API for Stance.
//!
//! Exposes an axum [`Router`] serving the single `/api/profile` resource,
//! backed by any [`ProfileStore`] and gated by any [`IdentityVerifier`].
//!
//! | Method   | Success | Notes |
//! |----------|---------|-------|
//! | `POST`   | 200 | Body: `{"politicalAffiliation":"…"}` |
//! | `GET`    | 200 | 404 if no profile |
//! | `PUT`    | 200 | Body: any of `email`, `politicalAffiliation`, `survey` |
//! | `DELETE` | 201 | Returns the deleted profile |

pub mod auth;
pub mod body;
pub mod error;
pub mod profile;
pub mod response;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  http::{HeaderName, HeaderValue, Method, header, header::InvalidHeaderValue},
  middleware,
  routing::post,
};
use serde::Deserialize;
use stance_core::{identity::IdentityVerifier, store::ProfileStore};
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `STANCE_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  pub identity_base_url:     String,
  pub identity_api_key:      String,
  pub identity_timeout_secs: u64,
  pub cors_allow_origin:     String,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the auth gate and all handlers.
pub struct AppState<S, V> {
  pub store:    Arc<S>,
  pub verifier: Arc<V>,
}

impl<S, V> Clone for AppState<S, V> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      verifier: Arc::clone(&self.verifier),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the profile [`Router`].
///
/// The auth gate wraps every route and the fallback, so no request reaches a
/// handler (or learns whether a path exists) without a verified identity.
pub fn router<S, V>(state: AppState<S, V>) -> Router
where
  S: ProfileStore + 'static,
  V: IdentityVerifier + 'static,
{
  Router::new()
    .route(
      "/api/profile",
      post(profile::create::<S, V>)
        .get(profile::read::<S, V>)
        .put(profile::update::<S, V>)
        .delete(profile::delete::<S, V>),
    )
    .fallback(profile::fallback)
    .layer(middleware::from_fn_with_state(
      state.clone(),
      auth::require_identity::<S, V>,
    ))
    .with_state(state)
}

/// CORS policy for browser clients. `"*"` allows any origin.
pub fn cors_layer(allow_origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
  let origin = if allow_origin == "*" {
    AllowOrigin::any()
  } else {
    AllowOrigin::exact(HeaderValue::from_str(allow_origin)?)
  };

  Ok(
    CorsLayer::new()
      .allow_origin(origin)
      .allow_methods([Method::POST, Method::GET, Method::PUT, Method::DELETE])
      .allow_headers([
        header::AUTHORIZATION,
        HeaderName::from_static("x-requested-with"),
        HeaderName::from_static("x-http-method-override"),
        header::CONTENT_TYPE,
        header::ACCEPT,
      ]),
  )
}

/// The full service: CORS and request tracing around [`router`].
///
/// CORS sits outside the auth gate so preflight requests are answered
/// without a token.
pub fn app<S, V>(state: AppState<S, V>, cors: CorsLayer) -> Router
where
  S: ProfileStore + 'static,
  V: IdentityVerifier + 'static,
{
  router(state)
    .layer(cors)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
