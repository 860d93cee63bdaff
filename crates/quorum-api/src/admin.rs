//! Handlers for `/admin` endpoints.
//!
//! Every mutation here re-verifies the caller's identity claim inside the
//! engine; the handlers carry no authorization logic of their own.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use quorum_core::{
  audit::{AuditEntry, IncomeTransaction, NewIncomeTransaction},
  event::NewEvent,
  identity::IdentityProvider,
  profile::{MembershipStatus, Profile, Role},
  store::CommunityStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::Caller};

/// `POST /admin/bootstrap` — first-admin claim escalation.
pub async fn bootstrap<I, S>(
  State(state): State<AppState<I, S>>,
  caller: Caller,
) -> Result<StatusCode, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  state.claims.bootstrap(&caller.principal).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct MembersParams {
  pub status: Option<MembershipStatus>,
}

/// `GET /admin/members[?status=pending|approved|rejected]`
pub async fn members<I, S>(
  State(state): State<AppState<I, S>>,
  Query(params): Query<MembersParams>,
  caller: Caller,
) -> Result<Json<Vec<Profile>>, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let members = state
    .admin
    .list_members(&caller.principal, params.status)
    .await?;
  Ok(Json(members))
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
  pub role: Role,
}

/// `POST /admin/users/:id/role` — body: `{"role":"admin"|"member"}`
pub async fn set_role<I, S>(
  State(state): State<AppState<I, S>>,
  Path(target): Path<Uuid>,
  caller: Caller,
  Json(body): Json<RoleBody>,
) -> Result<StatusCode, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  state
    .claims
    .set_role(&caller.principal, target, body.role)
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: MembershipStatus,
}

/// `POST /admin/users/:id/status` — approve or reject a membership.
pub async fn set_status<I, S>(
  State(state): State<AppState<I, S>>,
  Path(target): Path<Uuid>,
  caller: Caller,
  Json(body): Json<StatusBody>,
) -> Result<StatusCode, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  state
    .admin
    .set_status(&caller.principal, target, body.status)
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SuspendBody {
  pub suspended: bool,
}

/// `POST /admin/users/:id/suspend` — body: `{"suspended":true|false}`
pub async fn set_suspended<I, S>(
  State(state): State<AppState<I, S>>,
  Path(target): Path<Uuid>,
  caller: Caller,
  Json(body): Json<SuspendBody>,
) -> Result<StatusCode, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  state
    .admin
    .set_suspended(&caller.principal, target, body.suspended)
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /admin/users/:id` — removes sign-in; the profile stays.
pub async fn delete_user<I, S>(
  State(state): State<AppState<I, S>>,
  Path(target): Path<Uuid>,
  caller: Caller,
) -> Result<StatusCode, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  state
    .claims
    .delete_principal(&caller.principal, target)
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CreateEventBody {
  pub title:            String,
  pub starts_at:        DateTime<Utc>,
  pub location:         String,
  #[serde(default)]
  pub description:      String,
  /// 0 means unlimited.
  #[serde(default)]
  pub max_participants: u32,
}

/// `POST /admin/events`
pub async fn create_event<I, S>(
  State(state): State<AppState<I, S>>,
  caller: Caller,
  Json(body): Json<CreateEventBody>,
) -> Result<impl IntoResponse, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let event = state
    .admin
    .create_event(&caller.principal, NewEvent {
      title:            body.title,
      starts_at:        body.starts_at,
      location:         body.location,
      description:      body.description,
      max_participants: body.max_participants,
      created_by:       caller.principal.principal_id,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `DELETE /admin/events/:id` — deletes the event and cascades its RSVPs.
pub async fn delete_event<I, S>(
  State(state): State<AppState<I, S>>,
  Path(event_id): Path<Uuid>,
  caller: Caller,
) -> Result<StatusCode, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  state.admin.delete_event(&caller.principal, event_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /admin/income`
pub async fn record_income<I, S>(
  State(state): State<AppState<I, S>>,
  caller: Caller,
  Json(body): Json<NewIncomeTransaction>,
) -> Result<impl IntoResponse, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let tx = state.admin.record_income(&caller.principal, body).await?;
  Ok((StatusCode::CREATED, Json(tx)))
}

/// `GET /admin/income`
pub async fn income<I, S>(
  State(state): State<AppState<I, S>>,
  caller: Caller,
) -> Result<Json<Vec<IncomeTransaction>>, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  Ok(Json(state.admin.income_transactions(&caller.principal).await?))
}

#[derive(Debug, Deserialize)]
pub struct AuditParams {
  pub limit: Option<usize>,
}

/// `GET /admin/audit[?limit=N]` — newest entries first, default 50.
pub async fn audit<I, S>(
  State(state): State<AppState<I, S>>,
  Query(params): Query<AuditParams>,
  caller: Caller,
) -> Result<Json<Vec<AuditEntry>>, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let limit = params.limit.unwrap_or(50);
  Ok(Json(state.admin.audit_log(&caller.principal, limit).await?))
}
