//! Router integration tests over in-memory backends.

use std::time::{Duration, Instant};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use quorum_core::{
  identity::{Claims, IdentityProvider as _},
  profile::{MembershipStatus, Role},
  store::CommunityStore as _,
};
use quorum_engine::AccessController;
use quorum_identity::LocalIdentity;
use quorum_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, router};

type State = AppState<LocalIdentity, SqliteStore>;

async fn make_state() -> State {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState::new(LocalIdentity::new(), store)
}

async fn send(
  state: State,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let req = match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  router(state).oneshot(req).await.unwrap()
}

async fn body_json(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

/// Register via the API and sign in, returning `(principal_id, token)`.
async fn register_and_login(state: &State, email: &str) -> (uuid::Uuid, String) {
  let resp = send(
    state.clone(),
    "POST",
    "/auth/register",
    None,
    Some(json!({ "name": "Member", "email": email, "password": "pw" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let profile = body_json(resp).await;
  let id = profile["principal_id"].as_str().unwrap().parse().unwrap();

  let resp = send(
    state.clone(),
    "POST",
    "/auth/login",
    None,
    Some(json!({ "email": email, "password": "pw" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let login = body_json(resp).await;
  (id, login["token"].as_str().unwrap().to_string())
}

async fn approved_member(state: &State, email: &str) -> (uuid::Uuid, String) {
  let (id, token) = register_and_login(state, email).await;
  state
    .store
    .set_status(id, MembershipStatus::Approved)
    .await
    .unwrap();
  (id, token)
}

/// An admin with profile role, identity claim, and a live token.
async fn admin(state: &State, email: &str) -> (uuid::Uuid, String) {
  let (id, token) = approved_member(state, email).await;
  state.store.set_role(id, Role::Admin).await.unwrap();
  state.identity.set_claims(id, Claims::admin()).await.unwrap();
  (id, token)
}

// ─── Auth & access states ────────────────────────────────────────────────────

#[tokio::test]
async fn me_without_token_is_guest() {
  let state = make_state().await;
  let resp = send(state, "GET", "/me", None, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let me = body_json(resp).await;
  assert_eq!(me["state"], "guest");
  assert!(me["profile"].is_null());
}

#[tokio::test]
async fn fresh_registration_is_pending() {
  let state = make_state().await;
  let (_, token) = register_and_login(&state, "alice@example.com").await;

  let resp = send(state.clone(), "GET", "/me", Some(&token), None).await;
  let me = body_json(resp).await;
  assert_eq!(me["state"], "pending");
  assert_eq!(me["profile"]["status"], "pending");

  // Pending members cannot reach member routes.
  let resp = send(state, "GET", "/events", Some(&token), None).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn member_routes_require_a_token() {
  let state = make_state().await;
  for uri in ["/events", "/posts", "/events/mine"] {
    let resp = send(state.clone(), "GET", uri, None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
  }
}

#[tokio::test]
async fn wrong_password_is_401_and_duplicate_email_is_400() {
  let state = make_state().await;
  register_and_login(&state, "alice@example.com").await;

  let resp = send(
    state.clone(),
    "POST",
    "/auth/login",
    None,
    Some(json!({ "email": "alice@example.com", "password": "nope" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = send(
    state,
    "POST",
    "/auth/register",
    None,
    Some(json!({ "name": "Dup", "email": "alice@example.com", "password": "pw" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_revokes_the_token() {
  let state = make_state().await;
  let (_, token) = approved_member(&state, "alice@example.com").await;

  let resp = send(state.clone(), "POST", "/auth/logout", Some(&token), None).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let resp = send(state, "GET", "/events", Some(&token), None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn suspended_member_is_guest_with_notice() {
  let state = make_state().await;
  let (_, admin_token) = admin(&state, "root@example.com").await;
  let (member_id, member_token) =
    approved_member(&state, "bob@example.com").await;

  let resp = send(
    state.clone(),
    "POST",
    &format!("/admin/users/{member_id}/suspend"),
    Some(&admin_token),
    Some(json!({ "suspended": true })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  state
    .store
    .put_suspension_notice(member_id, "account suspended")
    .await
    .unwrap();

  let resp = send(state.clone(), "GET", "/events", Some(&member_token), None).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = send(state.clone(), "GET", "/me", Some(&member_token), None).await;
  let me = body_json(resp).await;
  assert_eq!(me["state"], "guest");
  assert_eq!(me["suspension_notice"], "account suspended");

  // One-shot: gone on the next read.
  let resp = send(state, "GET", "/me", Some(&member_token), None).await;
  let me = body_json(resp).await;
  assert!(me["suspension_notice"].is_null());
}

#[tokio::test]
async fn suspended_login_still_delivers_the_notice() {
  let state = make_state().await;
  // Same wiring as the server binary: the controller consumes session
  // events and revokes a suspended member's sessions as soon as it sees
  // them, so the login response is the only place the notice can land.
  let controller =
    AccessController::new(state.identity.clone(), state.store.clone());
  let _ctx_rx = controller.subscribe();
  tokio::spawn(controller.run());

  let (_, admin_token) = admin(&state, "root@example.com").await;
  let (member_id, _) = approved_member(&state, "bob@example.com").await;
  let resp = send(
    state.clone(),
    "POST",
    &format!("/admin/users/{member_id}/suspend"),
    Some(&admin_token),
    Some(json!({ "suspended": true })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let resp = send(
    state.clone(),
    "POST",
    "/auth/login",
    None,
    Some(json!({ "email": "bob@example.com", "password": "pw" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let login = body_json(resp).await;
  assert_eq!(login["state"], "guest");
  let notice = login["suspension_notice"].as_str().unwrap();
  assert!(notice.contains("suspended"), "{notice}");

  // The controller kills the fresh session shortly after.
  let token = login["token"].as_str().unwrap().to_string();
  let deadline = Instant::now() + Duration::from_secs(2);
  while state.identity.authenticate(&token).await.unwrap().is_some() {
    assert!(Instant::now() < deadline, "session was never revoked");
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
}

#[tokio::test]
async fn profile_update_merges_fields() {
  let state = make_state().await;
  let (_, token) = approved_member(&state, "alice@example.com").await;

  let resp = send(
    state,
    "POST",
    "/me/profile",
    Some(&token),
    Some(json!({ "bio": "Hello there" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let profile = body_json(resp).await;
  assert_eq!(profile["bio"], "Hello there");
  assert_eq!(profile["name"], "Member");
}

// ─── Events ──────────────────────────────────────────────────────────────────

async fn create_event(state: &State, admin_token: &str, cap: u32) -> String {
  let resp = send(
    state.clone(),
    "POST",
    "/admin/events",
    Some(admin_token),
    Some(json!({
      "title": "Meetup",
      "starts_at": "2030-01-01T18:00:00Z",
      "location": "Hall",
      "max_participants": cap,
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  body_json(resp).await["event_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn full_event_returns_conflict() {
  let state = make_state().await;
  let (_, admin_token) = admin(&state, "root@example.com").await;
  let event_id = create_event(&state, &admin_token, 1).await;

  let (_, alice) = approved_member(&state, "alice@example.com").await;
  let (_, bob) = approved_member(&state, "bob@example.com").await;

  let resp = send(
    state.clone(),
    "POST",
    &format!("/events/{event_id}/rsvp"),
    Some(&alice),
    Some(json!({ "status": "going" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = send(
    state.clone(),
    "POST",
    &format!("/events/{event_id}/rsvp"),
    Some(&bob),
    Some(json!({ "status": "going" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);

  // Alice leaving frees the seat for Bob.
  let resp = send(
    state.clone(),
    "DELETE",
    &format!("/events/{event_id}/rsvp"),
    Some(&alice),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let resp = send(
    state,
    "POST",
    &format!("/events/{event_id}/rsvp"),
    Some(&bob),
    Some(json!({ "status": "going" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn rsvp_on_unknown_event_is_404() {
  let state = make_state().await;
  let (_, token) = approved_member(&state, "alice@example.com").await;
  let resp = send(
    state,
    "POST",
    &format!("/events/{}/rsvp", uuid::Uuid::new_v4()),
    Some(&token),
    Some(json!({ "status": "going" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn events_mine_lists_registrations() {
  let state = make_state().await;
  let (_, admin_token) = admin(&state, "root@example.com").await;
  let event_id = create_event(&state, &admin_token, 0).await;
  let (_, token) = approved_member(&state, "alice@example.com").await;

  send(
    state.clone(),
    "POST",
    &format!("/events/{event_id}/rsvp"),
    Some(&token),
    Some(json!({ "status": "interested" })),
  )
  .await;

  let resp = send(state, "GET", "/events/mine", Some(&token), None).await;
  let mine = body_json(resp).await;
  assert_eq!(mine, json!([event_id]));
}

// ─── Feed ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn post_like_comment_round_trip() {
  let state = make_state().await;
  let (_, token) = approved_member(&state, "alice@example.com").await;

  let resp = send(
    state.clone(),
    "POST",
    "/posts",
    Some(&token),
    Some(json!({ "body": "hello world" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let post_id = body_json(resp).await["post_id"].as_str().unwrap().to_string();

  let resp = send(
    state.clone(),
    "POST",
    &format!("/posts/{post_id}/like"),
    Some(&token),
    None,
  )
  .await;
  assert_eq!(body_json(resp).await["liked"], true);

  let resp = send(
    state.clone(),
    "POST",
    &format!("/posts/{post_id}/comments"),
    Some(&token),
    Some(json!({ "body": "first!" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let resp = send(state, "GET", "/posts", Some(&token), None).await;
  let posts = body_json(resp).await;
  assert_eq!(posts[0]["likes_count"], 1);
  assert_eq!(posts[0]["comment_count"], 1);
}

#[tokio::test]
async fn only_author_or_admin_deletes_a_post() {
  let state = make_state().await;
  let (_, alice) = approved_member(&state, "alice@example.com").await;
  let (_, bob) = approved_member(&state, "bob@example.com").await;
  let (_, admin_token) = admin(&state, "root@example.com").await;

  let resp = send(
    state.clone(),
    "POST",
    "/posts",
    Some(&alice),
    Some(json!({ "body": "mine" })),
  )
  .await;
  let post_id = body_json(resp).await["post_id"].as_str().unwrap().to_string();

  let resp = send(
    state.clone(),
    "DELETE",
    &format!("/posts/{post_id}"),
    Some(&bob),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = send(
    state.clone(),
    "DELETE",
    &format!("/posts/{post_id}"),
    Some(&admin_token),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn empty_post_body_is_400() {
  let state = make_state().await;
  let (_, token) = approved_member(&state, "alice@example.com").await;
  let resp = send(
    state,
    "POST",
    "/posts",
    Some(&token),
    Some(json!({ "body": "  " })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ─── Admin ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn bootstrap_requires_admin_profile_role() {
  let state = make_state().await;
  let (id, token) = approved_member(&state, "alice@example.com").await;

  let resp =
    send(state.clone(), "POST", "/admin/bootstrap", Some(&token), None).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  state.store.set_role(id, Role::Admin).await.unwrap();
  let resp =
    send(state.clone(), "POST", "/admin/bootstrap", Some(&token), None).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  // With the claim in place, admin reads now work.
  let resp = send(state, "GET", "/admin/members", Some(&token), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_routes_reject_plain_members() {
  let state = make_state().await;
  let (_, token) = approved_member(&state, "alice@example.com").await;

  let resp = send(state.clone(), "GET", "/admin/members", Some(&token), None).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = send(
    state.clone(),
    "POST",
    &format!("/admin/users/{}/status", uuid::Uuid::new_v4()),
    Some(&token),
    Some(json!({ "status": "approved" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = send(
    state,
    "POST",
    "/admin/events",
    Some(&token),
    Some(json!({
      "title": "Meetup",
      "starts_at": "2030-01-01T18:00:00Z",
      "location": "Hall",
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn approval_flow_through_the_api() {
  let state = make_state().await;
  let (_, admin_token) = admin(&state, "root@example.com").await;
  let (member_id, member_token) =
    register_and_login(&state, "bob@example.com").await;

  let resp = send(
    state.clone(),
    "GET",
    "/admin/members?status=pending",
    Some(&admin_token),
    None,
  )
  .await;
  let pending = body_json(resp).await;
  assert_eq!(pending.as_array().unwrap().len(), 1);

  let resp = send(
    state.clone(),
    "POST",
    &format!("/admin/users/{member_id}/status"),
    Some(&admin_token),
    Some(json!({ "status": "approved" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let resp = send(state, "GET", "/events", Some(&member_token), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn income_is_validated_and_listed() {
  let state = make_state().await;
  let (_, admin_token) = admin(&state, "root@example.com").await;

  let resp = send(
    state.clone(),
    "POST",
    "/admin/income",
    Some(&admin_token),
    Some(json!({
      "amount_cents": -5,
      "method": "cash",
      "purpose": "dues",
      "category": "dues",
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = send(
    state.clone(),
    "POST",
    "/admin/income",
    Some(&admin_token),
    Some(json!({
      "amount_cents": 2500,
      "method": "bank_transfer",
      "purpose": "membership dues",
      "category": "dues",
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let resp = send(state, "GET", "/admin/income", Some(&admin_token), None).await;
  let listed = body_json(resp).await;
  assert_eq!(listed[0]["amount_cents"], 2500);
}

#[tokio::test]
async fn audit_log_records_privileged_actions() {
  let state = make_state().await;
  let (_, admin_token) = admin(&state, "root@example.com").await;
  let (member_id, _) = register_and_login(&state, "bob@example.com").await;

  send(
    state.clone(),
    "POST",
    &format!("/admin/users/{member_id}/status"),
    Some(&admin_token),
    Some(json!({ "status": "approved" })),
  )
  .await;
  send(
    state.clone(),
    "POST",
    &format!("/admin/users/{member_id}/role"),
    Some(&admin_token),
    Some(json!({ "role": "admin" })),
  )
  .await;

  let resp = send(state, "GET", "/admin/audit?limit=10", Some(&admin_token), None).await;
  let log = body_json(resp).await;
  let actions: Vec<&str> = log
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["action"].as_str().unwrap())
    .collect();
  assert!(actions.contains(&"set_status"));
  assert!(actions.contains(&"set_role"));
}

#[tokio::test]
async fn delete_user_keeps_profile_but_kills_login() {
  let state = make_state().await;
  let (_, admin_token) = admin(&state, "root@example.com").await;
  let (member_id, member_token) =
    approved_member(&state, "bob@example.com").await;

  let resp = send(
    state.clone(),
    "DELETE",
    &format!("/admin/users/{member_id}"),
    Some(&admin_token),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  // Token is dead, but the membership document survives.
  let resp = send(state.clone(), "GET", "/events", Some(&member_token), None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(state.store.profile(member_id).await.unwrap().is_some());

  let resp = send(
    state.clone(),
    "POST",
    "/auth/login",
    None,
    Some(json!({ "email": "bob@example.com", "password": "pw" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
