//! Request body extractor for profile writes.
//!
//! Accepts JSON and `application/x-www-form-urlencoded` bodies. A missing or
//! blank body decodes to `T::default()` so that field validation, not body
//! parsing, reports what is absent.

use axum::{
  Form, Json,
  body::Body,
  extract::{FromRequest, Request},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

/// Largest body read before decoding.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// A decoded profile body.
pub struct ProfileBody<T>(pub T);

/// A body that is present but could not be decoded.
#[derive(Debug)]
pub struct BodyRejection(pub String);

impl IntoResponse for BodyRejection {
  fn into_response(self) -> Response {
    (StatusCode::BAD_REQUEST, self.0).into_response()
  }
}

fn is_form(req: &Request) -> bool {
  req
    .headers()
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .and_then(|ct| ct.split(';').next())
    .is_some_and(|mime| {
      mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded")
    })
}

impl<S, T> FromRequest<S> for ProfileBody<T>
where
  S: Send + Sync,
  T: DeserializeOwned + Default + Send,
{
  type Rejection = BodyRejection;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let form = is_form(&req);
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, BODY_LIMIT)
      .await
      .map_err(|e| BodyRejection(e.to_string()))?;

    if bytes.trim_ascii().is_empty() {
      return Ok(Self(T::default()));
    }

    let req = Request::from_parts(parts, Body::from(bytes));
    if form {
      Form::<T>::from_request(req, state)
        .await
        .map(|Form(b)| Self(b))
        .map_err(|e| BodyRejection(e.body_text()))
    } else {
      Json::<T>::from_request(req, state)
        .await
        .map(|Json(b)| Self(b))
        .map_err(|e| BodyRejection(e.body_text()))
    }
  }
}
