//! Remote identity-token verification for Stance.
//!
//! [`IdentityToolkitVerifier`] asks an Identity Toolkit compatible authority
//! (`POST /v1/accounts:lookup`) to resolve an ID token to its account.

pub mod error;

mod toolkit;

pub use error::{Error, Result};
pub use toolkit::{DEFAULT_BASE_URL, IdentityToolkitConfig, IdentityToolkitVerifier};
