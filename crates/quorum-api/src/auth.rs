//! Handlers for registration, session, and `/me` endpoints.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use quorum_core::{
  Error,
  identity::IdentityProvider,
  profile::{NewProfile, Profile, ProfilePatch},
  store::CommunityStore,
};
use quorum_engine::{AccessState, access};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, extract::{Caller, MaybeCaller}};

/// Wire name for an access state.
pub(crate) fn state_name(state: AccessState) -> &'static str {
  match state {
    AccessState::Unresolved => "unresolved",
    AccessState::Guest      => "guest",
    AccessState::Pending    => "pending",
    AccessState::Rejected   => "rejected",
    AccessState::Approved   => "approved",
    AccessState::Admin      => "admin",
  }
}

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub name:     String,
  pub email:    String,
  pub password: String,
  pub phone:    Option<String>,
  pub bio:      Option<String>,
}

/// `POST /auth/register` — create credentials and the pending profile.
pub async fn register<I, S>(
  State(state): State<AppState<I, S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  for (field, value) in [
    ("name", &body.name),
    ("email", &body.email),
    ("password", &body.password),
  ] {
    if value.trim().is_empty() {
      return Err(Error::InvalidArgument(format!("{field} must not be empty")).into());
    }
  }

  let principal = state
    .identity
    .sign_up(&body.email, &body.password)
    .await
    .map_err(Error::unavailable)?
    .ok_or_else(|| Error::InvalidArgument("email already registered".into()))?;

  let profile = state
    .store
    .create_profile(NewProfile {
      principal_id: principal.principal_id,
      name:         body.name,
      email:        principal.email.clone(),
      phone:        body.phone,
      bio:          body.bio,
    })
    .await
    .map_err(Error::unavailable)?;

  Ok((StatusCode::CREATED, Json(profile)))
}

// ─── Login / logout / reset ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:             String,
  pub state:             &'static str,
  pub profile:           Option<Profile>,
  /// Present when the account is suspended. Login is the one exchange a
  /// suspended member is guaranteed to complete before the controller
  /// terminates the session, so the notice rides along here.
  pub suspension_notice: Option<String>,
}

/// `POST /auth/login`
pub async fn login<I, S>(
  State(state): State<AppState<I, S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let session = state
    .identity
    .sign_in(&body.email, &body.password)
    .await
    .map_err(Error::unavailable)?
    .ok_or(Error::Unauthenticated)?;

  if let Err(error) = state.store.record_login(session.principal.principal_id).await
  {
    tracing::warn!(%error, "failed to stamp last login");
  }

  let ctx = access::authorize(&state.store, Some(session.principal)).await?;

  let suspension_notice = match &ctx.profile {
    Some(profile) if profile.suspended => {
      // The controller races this handler to persist the stored notice;
      // fall back to the standard message if it has not landed yet.
      let stored = state
        .store
        .take_suspension_notice(profile.principal_id)
        .await
        .map_err(Error::unavailable)?;
      Some(stored.unwrap_or_else(|| access::SUSPENSION_NOTICE.to_string()))
    }
    _ => None,
  };

  Ok(Json(LoginResponse {
    token: session.token,
    state: state_name(ctx.state),
    profile: ctx.profile,
    suspension_notice,
  }))
}

/// `POST /auth/logout` — idempotent; a guest logout is a no-op.
pub async fn logout<I, S>(
  State(state): State<AppState<I, S>>,
  MaybeCaller(caller): MaybeCaller,
) -> Result<StatusCode, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  if let Some(caller) = caller {
    state
      .identity
      .sign_out(&caller.token)
      .await
      .map_err(Error::unavailable)?;
  }
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ResetBody {
  pub email: String,
}

/// `POST /auth/reset` — always 204, regardless of whether the email exists.
pub async fn reset<I, S>(
  State(state): State<AppState<I, S>>,
  Json(body): Json<ResetBody>,
) -> Result<StatusCode, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  state
    .identity
    .send_password_reset(&body.email)
    .await
    .map_err(Error::unavailable)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Me ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MeResponse {
  pub state:             &'static str,
  pub profile:           Option<Profile>,
  /// Present at most once after a suspension; reading consumes it.
  pub suspension_notice: Option<String>,
}

/// `GET /me` — the caller's access state, profile, and any one-shot
/// suspension notice.
pub async fn me<I, S>(
  State(state): State<AppState<I, S>>,
  MaybeCaller(caller): MaybeCaller,
) -> Result<Json<MeResponse>, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let principal = caller.map(|c| c.principal);
  let ctx = access::authorize(&state.store, principal).await?;

  let suspension_notice = match (&ctx.principal, &ctx.profile) {
    (Some(p), Some(profile)) if profile.suspended => state
      .store
      .take_suspension_notice(p.principal_id)
      .await
      .map_err(Error::unavailable)?,
    _ => None,
  };

  Ok(Json(MeResponse {
    state: state_name(ctx.state),
    profile: ctx.profile,
    suspension_notice,
  }))
}

/// `POST /me/profile` — merge subject-editable contact fields.
pub async fn update_profile<I, S>(
  State(state): State<AppState<I, S>>,
  caller: Caller,
  Json(patch): Json<ProfilePatch>,
) -> Result<Json<Profile>, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let id = caller.principal.principal_id;
  if !state
    .store
    .update_contact(id, patch)
    .await
    .map_err(Error::unavailable)?
  {
    return Err(Error::NotFound(format!("profile {id}")).into());
  }
  let profile = state
    .store
    .profile(id)
    .await
    .map_err(Error::unavailable)?
    .ok_or_else(|| Error::NotFound(format!("profile {id}")))?;
  Ok(Json(profile))
}
