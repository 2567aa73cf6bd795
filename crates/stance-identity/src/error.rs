//! Error type for `stance-identity`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The authority rejected the token, or the account cannot sign in.
  #[error("invalid token: {0}")]
  InvalidToken(String),

  #[error("identity authority returned {0}")]
  UnexpectedStatus(StatusCode),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
