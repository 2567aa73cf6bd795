//! Router-level tests: the full middleware stack against an in-memory store.

use std::{collections::HashMap, sync::Arc};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use stance_core::{
  identity::{Identity, IdentityVerifier},
  profile::{NewProfile, Profile, ProfileUpdate},
  store::{CreateOutcome, ProfileStore},
};
use stance_store_sqlite::SqliteStore;
use tower::ServiceExt as _;

use super::*;

// A verifier that knows a fixed set of tokens.
#[derive(Default)]
struct StaticVerifier {
  tokens: HashMap<String, Identity>,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown token")]
struct UnknownToken;

impl IdentityVerifier for StaticVerifier {
  type Error = UnknownToken;

  async fn verify(&self, token: &str) -> Result<Identity, UnknownToken> {
    self.tokens.get(token).cloned().ok_or(UnknownToken)
  }
}

const ALICE: &str = "alice-token";
const BOB: &str = "bob-token";
const NO_EMAIL: &str = "no-email-token";

fn alice_verifier() -> StaticVerifier {
  let mut verifier = StaticVerifier::default();
  verifier.tokens.insert(ALICE.into(), Identity {
    id:    "alice".into(),
    email: "alice@example.com".into(),
  });
  verifier
}

async fn make_app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();

  let mut verifier = StaticVerifier::default();
  for (token, id, email) in [
    (ALICE, "alice", "alice@example.com"),
    (BOB, "bob", "bob@example.com"),
    (NO_EMAIL, "carol", ""),
  ] {
    verifier.tokens.insert(token.into(), Identity {
      id:    id.into(),
      email: email.into(),
    });
  }

  router(AppState {
    store:    Arc::new(store),
    verifier: Arc::new(verifier),
  })
}

async fn send_raw(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let body = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, body)
}

async fn send(
  app:    &Router,
  method: &str,
  token:  Option<&str>,
  body:   Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri("/api/profile");
  if let Some(t) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  send_raw(app, builder.body(body).unwrap()).await
}

async fn send_with(
  app:          &Router,
  method:       &str,
  content_type: &str,
  body:         &str,
) -> (StatusCode, Value) {
  let req = Request::builder()
    .method(method)
    .uri("/api/profile")
    .header(header::AUTHORIZATION, format!("Bearer {ALICE}"))
    .header(header::CONTENT_TYPE, content_type)
    .body(Body::from(body.to_owned()))
    .unwrap();
  send_raw(app, req).await
}

async fn create_alice(app: &Router) -> Value {
  let (status, body) = send(
    app,
    "POST",
    Some(ALICE),
    Some(json!({ "politicalAffiliation": "Independent" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  body
}

// ── Auth gate ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_header_is_forbidden() {
  let app = make_app().await;
  for method in ["POST", "GET", "PUT", "DELETE"] {
    let (status, body) = send(&app, method, None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "Unauthorized" }));
  }
}

#[tokio::test]
async fn unknown_token_is_forbidden() {
  let app = make_app().await;
  let (status, body) = send(&app, "GET", Some("forged"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body, json!({ "message": "Unauthorized" }));
}

#[tokio::test]
async fn header_without_token_is_forbidden() {
  let app = make_app().await;
  let req = Request::builder()
    .method("GET")
    .uri("/api/profile")
    .header(header::AUTHORIZATION, "Bearer")
    .body(Body::empty())
    .unwrap();
  let (status, _) = send_raw(&app, req).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn rejected_request_never_reaches_handler() {
  let app = make_app().await;
  let (status, _) = send(
    &app,
    "POST",
    Some("forged"),
    Some(json!({ "politicalAffiliation": "Independent" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  // Nothing was written for anybody.
  let (status, _) = send(&app, "GET", Some(ALICE), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_path_is_gated_too() {
  let app = make_app().await;
  let req = Request::builder()
    .uri("/api/other")
    .body(Body::empty())
    .unwrap();
  let (status, _) = send_raw(&app, req).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let req = Request::builder()
    .uri("/api/other")
    .header(header::AUTHORIZATION, format!("Bearer {ALICE}"))
    .body(Body::empty())
    .unwrap();
  let (status, _) = send_raw(&app, req).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_read() {
  let app = make_app().await;
  let created = create_alice(&app).await;
  assert_eq!(created["message"], "Successfully created profile!");
  assert_eq!(created["data"], json!({
    "email": "alice@example.com",
    "politicalAffiliation": "Independent",
  }));

  let (status, body) = send(&app, "GET", Some(ALICE), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Successfully retrieved profile!");
  assert_eq!(body["data"], created["data"]);
  assert!(body["data"].get("survey").is_none());
}

#[tokio::test]
async fn second_create_reports_existing_record() {
  let app = make_app().await;
  let first = create_alice(&app).await;

  let (status, body) = send(
    &app,
    "POST",
    Some(ALICE),
    Some(json!({ "politicalAffiliation": "Green" })),
  )
  .await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "Failed to create profile!");
  assert_eq!(body["error"]["kind"], "already_exists");
  assert_eq!(body["data"], first["data"]);
}

#[tokio::test]
async fn create_requires_political_affiliation() {
  let app = make_app().await;
  let (status, body) = send(&app, "POST", Some(ALICE), Some(json!({}))).await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"]["kind"], "validation");
  assert_eq!(body["error"]["fields"], json!([
    { "field": "politicalAffiliation", "message": "politicalAffiliation is required" }
  ]));

  let (status, _) = send(&app, "GET", Some(ALICE), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_requires_email_from_identity() {
  let app = make_app().await;
  let (status, body) = send(
    &app,
    "POST",
    Some(NO_EMAIL),
    Some(json!({ "politicalAffiliation": "Independent" })),
  )
  .await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"]["fields"][0]["field"], "email");
}

#[tokio::test]
async fn create_rejects_malformed_body() {
  let app = make_app().await;
  let req = Request::builder()
    .method("POST")
    .uri("/api/profile")
    .header(header::AUTHORIZATION, format!("Bearer {ALICE}"))
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{not json"))
    .unwrap();
  let (status, body) = send_raw(&app, req).await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "Failed to create profile!");
  assert_eq!(body["error"]["kind"], "invalid_body");
}

#[tokio::test]
async fn create_accepts_form_body() {
  let app = make_app().await;
  let (status, body) = send_with(
    &app,
    "POST",
    "application/x-www-form-urlencoded",
    "politicalAffiliation=Independent",
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["politicalAffiliation"], "Independent");
}

#[tokio::test]
async fn create_without_body_reports_missing_field() {
  let app = make_app().await;
  let (status, body) = send(&app, "POST", Some(ALICE), None).await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "Failed to create profile!");
  assert_eq!(body["error"]["kind"], "validation");
  assert_eq!(body["error"]["fields"][0]["field"], "politicalAffiliation");
}

#[tokio::test]
async fn create_rejects_unsupported_content_type() {
  let app = make_app().await;
  let (status, body) =
    send_with(&app, "POST", "text/plain", "politicalAffiliation=Green").await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"]["kind"], "invalid_body");
}

// A store that always loses the create race: nothing is found up front, but
// the insert collides with a row written in between.
struct RacingStore {
  winner: Profile,
}

impl ProfileStore for RacingStore {
  type Error = std::convert::Infallible;

  async fn find(&self, _id: &str) -> Result<Option<Profile>, Self::Error> {
    Ok(None)
  }

  async fn create(&self, _input: NewProfile) -> Result<CreateOutcome, Self::Error> {
    Ok(CreateOutcome::Exists(self.winner.clone()))
  }

  async fn update(
    &self,
    _id: &str,
    _update: ProfileUpdate,
  ) -> Result<Option<Profile>, Self::Error> {
    Ok(None)
  }

  async fn delete(&self, _id: &str) -> Result<Option<Profile>, Self::Error> {
    Ok(None)
  }
}

#[tokio::test]
async fn create_losing_race_reports_winner() {
  let winner = Profile {
    id:                    "alice".into(),
    email:                 "alice@example.com".into(),
    political_affiliation: "Green".into(),
    survey:                Default::default(),
  };
  let app = router(AppState {
    store:    Arc::new(RacingStore { winner }),
    verifier: Arc::new(alice_verifier()),
  });

  let (status, body) = send(
    &app,
    "POST",
    Some(ALICE),
    Some(json!({ "politicalAffiliation": "Independent" })),
  )
  .await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "Failed to create profile!");
  assert_eq!(body["error"]["kind"], "already_exists");
  assert_eq!(body["data"], json!({
    "email": "alice@example.com",
    "politicalAffiliation": "Green",
  }));
}

// ── Read ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn read_missing_is_not_found() {
  let app = make_app().await;
  let (status, body) = send(&app, "GET", Some(ALICE), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "Failed to retrieve profile!");
  assert!(body.get("data").is_none());
}

#[tokio::test]
async fn identities_do_not_see_each_other() {
  let app = make_app().await;
  create_alice(&app).await;
  let (status, _) = send(&app, "GET", Some(BOB), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn survey_only_update_keeps_top_level_fields() {
  let app = make_app().await;
  create_alice(&app).await;

  let (status, body) = send(
    &app,
    "PUT",
    Some(ALICE),
    Some(json!({ "survey": { "k": { "wouldCite": true } } })),
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Successfully updated profile!");
  assert_eq!(body["data"], json!({
    "email": "alice@example.com",
    "politicalAffiliation": "Independent",
    "survey": { "k": { "wouldCite": true } },
  }));
}

#[tokio::test]
async fn survey_updates_merge_and_repeat_cleanly() {
  let app = make_app().await;
  create_alice(&app).await;

  let k = json!({ "survey": { "k": { "wouldCite": true } } });
  let j = json!({ "survey": { "j": { "wouldCite": false } } });

  send(&app, "PUT", Some(ALICE), Some(k.clone())).await;
  let (_, after_j) = send(&app, "PUT", Some(ALICE), Some(j.clone())).await;
  let (_, again) = send(&app, "PUT", Some(ALICE), Some(j)).await;

  let expected = json!({
    "k": { "wouldCite": true },
    "j": { "wouldCite": false },
  });
  assert_eq!(after_j["data"]["survey"], expected);
  assert_eq!(again["data"], after_j["data"]);
}

#[tokio::test]
async fn update_ignores_empty_fields() {
  let app = make_app().await;
  create_alice(&app).await;

  let (status, body) = send(
    &app,
    "PUT",
    Some(ALICE),
    Some(json!({ "email": "", "politicalAffiliation": "Green" })),
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["email"], "alice@example.com");
  assert_eq!(body["data"]["politicalAffiliation"], "Green");
}

#[tokio::test]
async fn update_missing_is_not_found() {
  let app = make_app().await;
  let (status, body) = send(
    &app,
    "PUT",
    Some(ALICE),
    Some(json!({ "politicalAffiliation": "Green" })),
  )
  .await;

  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "Failed to update profile!");
  assert!(body.get("data").is_none());
}

#[tokio::test]
async fn update_accepts_form_body() {
  let app = make_app().await;
  create_alice(&app).await;

  let (status, body) = send_with(
    &app,
    "PUT",
    "application/x-www-form-urlencoded; charset=utf-8",
    "politicalAffiliation=Green&email=alice%40work.example",
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["email"], "alice@work.example");
  assert_eq!(body["data"]["politicalAffiliation"], "Green");
}

#[tokio::test]
async fn update_without_body_changes_nothing() {
  let app = make_app().await;
  let created = create_alice(&app).await;

  let (status, body) = send(&app, "PUT", Some(ALICE), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"], created["data"]);
}

#[tokio::test]
async fn update_rejects_malformed_json() {
  let app = make_app().await;
  create_alice(&app).await;

  let (status, body) =
    send_with(&app, "PUT", "application/json", "{\"survey\": 3}").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "Failed to update profile!");
  assert_eq!(body["error"]["kind"], "invalid_body");
}

// ── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_returns_record_then_read_is_not_found() {
  let app = make_app().await;
  create_alice(&app).await;
  send(
    &app,
    "PUT",
    Some(ALICE),
    Some(json!({ "survey": { "k": { "wouldCite": null } } })),
  )
  .await;

  let (status, body) = send(&app, "DELETE", Some(ALICE), None).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["message"], "Successfully deleted profile!");
  assert_eq!(body["data"]["survey"], json!({ "k": { "wouldCite": null } }));

  let (status, _) = send(&app, "GET", Some(ALICE), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  // No tombstone: the identity may start over.
  create_alice(&app).await;
}

#[tokio::test]
async fn delete_missing_is_not_found() {
  let app = make_app().await;
  let (status, body) = send(&app, "DELETE", Some(ALICE), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "Failed to delete profile!");
  assert!(body.get("data").is_none());
}

// ── CORS ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn preflight_skips_auth() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let app = app(
    AppState {
      store:    Arc::new(store),
      verifier: Arc::new(StaticVerifier::default()),
    },
    cors_layer("*").unwrap(),
  );

  let req = Request::builder()
    .method("OPTIONS")
    .uri("/api/profile")
    .header(header::ORIGIN, "https://example.com")
    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
    .body(Body::empty())
    .unwrap();
  let resp = app.oneshot(req).await.unwrap();

  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(
    resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
    "*",
  );
}

#[test]
fn cors_rejects_invalid_origin() {
  assert!(cors_layer("bad\norigin").is_err());
}
