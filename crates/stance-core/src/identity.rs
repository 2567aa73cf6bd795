//! The verified caller and the `IdentityVerifier` trait.

use std::future::Future;

/// A caller whose bearer token has been verified by the trust authority.
///
/// Only an [`IdentityVerifier`] produces these. The `id` is opaque and
/// immutable; it keys the caller's single profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub id:    String,
  /// Empty when the authority holds no email for the account.
  pub email: String,
}

/// Abstraction over the external authority that issues identity tokens.
///
/// Implementations may make a network call per verification. Results are
/// never cached by callers.
pub trait IdentityVerifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Verify an opaque bearer token and return the identity it was issued to.
  fn verify<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + 'a;
}
