//! The `ProfileStore` trait.
//!
//! Implemented by storage backends (e.g. `stance-store-sqlite`). The API layer
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::profile::{NewProfile, Profile, ProfileUpdate};

/// Result of [`ProfileStore::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
  /// The profile was inserted.
  Created(Profile),
  /// A profile with the same id already exists; nothing was written.
  Exists(Profile),
}

/// Abstraction over a profile store backend.
///
/// Profiles are keyed by identity id and the store is the authority on
/// uniqueness: two racing creates for one id must yield one `Created` and one
/// `Exists`.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a profile by identity id. Returns `None` if not found.
  fn find<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  /// Persist a new profile unless one already exists for its id.
  fn create(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<CreateOutcome, Self::Error>> + Send + '_;

  /// Apply a merge update and return the post-update profile.
  /// Returns `None` if no profile exists for `id`.
  fn update<'a>(
    &'a self,
    id: &'a str,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  /// Delete a profile and return its last state.
  /// Returns `None` if no profile exists for `id`.
  fn delete<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;
}
