//! [`IdentityToolkitVerifier`]: the HTTP implementation of
//! [`IdentityVerifier`].

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use stance_core::identity::{Identity, IdentityVerifier};

use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com";

/// Connection settings for the identity authority.
#[derive(Debug, Clone)]
pub struct IdentityToolkitConfig {
  pub base_url: String,
  pub api_key:  String,
  pub timeout:  Duration,
}

impl IdentityToolkitConfig {
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      api_key:  api_key.into(),
      timeout:  Duration::from_secs(10),
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LookupResponse {
  #[serde(default)]
  users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
  local_id: String,
  #[serde(default)]
  email:    Option<String>,
  #[serde(default)]
  disabled: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
  error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
  message: String,
}

// ─── Verifier ────────────────────────────────────────────────────────────────

/// Verifies ID tokens by looking up the account they were issued for.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct IdentityToolkitVerifier {
  client: Client,
  config: IdentityToolkitConfig,
}

impl IdentityToolkitVerifier {
  pub fn new(config: IdentityToolkitConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  fn lookup_url(&self) -> String {
    format!(
      "{}/v1/accounts:lookup",
      self.config.base_url.trim_end_matches('/')
    )
  }

  /// `POST /v1/accounts:lookup?key=<api_key>` with `{"idToken": <token>}`.
  pub async fn lookup(&self, token: &str) -> Result<Identity> {
    if token.is_empty() {
      return Err(Error::InvalidToken("empty token".to_string()));
    }

    let resp = self
      .client
      .post(self.lookup_url())
      .query(&[("key", self.config.api_key.as_str())])
      .json(&serde_json::json!({ "idToken": token }))
      .send()
      .await?;

    match resp.status() {
      StatusCode::OK => {}
      StatusCode::BAD_REQUEST => {
        let reason = resp
          .json::<ErrorResponse>()
          .await
          .map(|e| e.error.message)
          .unwrap_or_else(|_| "token rejected".to_string());
        return Err(Error::InvalidToken(reason));
      }
      status => return Err(Error::UnexpectedStatus(status)),
    }

    let account = resp
      .json::<LookupResponse>()
      .await?
      .users
      .into_iter()
      .next()
      .ok_or_else(|| Error::InvalidToken("no account for token".to_string()))?;

    if account.disabled {
      return Err(Error::InvalidToken(format!(
        "account {} is disabled",
        account.local_id
      )));
    }

    tracing::debug!(uid = %account.local_id, "verified identity token");

    Ok(Identity {
      id:    account.local_id,
      email: account.email.unwrap_or_default(),
    })
  }
}

impl IdentityVerifier for IdentityToolkitVerifier {
  type Error = Error;

  async fn verify(&self, token: &str) -> Result<Identity> { self.lookup(token).await }
}
