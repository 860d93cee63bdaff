//! Handlers for member-facing `/events` endpoints. All require an approved
//! membership.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use quorum_core::{
  event::{Event, Rsvp, RsvpStatus},
  identity::IdentityProvider,
  store::CommunityStore,
};
use quorum_engine::access;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::Caller};

/// `GET /events`
pub async fn list<I, S>(
  State(state): State<AppState<I, S>>,
  caller: Caller,
) -> Result<Json<Vec<Event>>, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let ctx = access::authorize(&state.store, Some(caller.principal)).await?;
  ctx.require_approved()?;
  Ok(Json(state.reservations.list_events().await?))
}

/// `GET /events/mine` — ids of every event the caller holds an RSVP for.
pub async fn mine<I, S>(
  State(state): State<AppState<I, S>>,
  caller: Caller,
) -> Result<Json<Vec<Uuid>>, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let ctx = access::authorize(&state.store, Some(caller.principal)).await?;
  let profile = ctx.require_approved()?;
  let ids = state
    .reservations
    .registered_event_ids(profile.principal_id)
    .await?;
  Ok(Json(ids))
}

#[derive(Debug, Default, Deserialize)]
pub struct RsvpBody {
  #[serde(default)]
  pub status: RsvpStatus,
}

/// `POST /events/:id/rsvp` — body: `{"status":"going"|"interested"}`.
/// 409 if the event is full.
pub async fn register<I, S>(
  State(state): State<AppState<I, S>>,
  Path(event_id): Path<Uuid>,
  caller: Caller,
  Json(body): Json<RsvpBody>,
) -> Result<Json<Rsvp>, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let ctx = access::authorize(&state.store, Some(caller.principal)).await?;
  let profile = ctx.require_approved()?;
  let rsvp = state
    .reservations
    .register(event_id, profile.principal_id, body.status)
    .await?;
  Ok(Json(rsvp))
}

/// `DELETE /events/:id/rsvp` — idempotent.
pub async fn unregister<I, S>(
  State(state): State<AppState<I, S>>,
  Path(event_id): Path<Uuid>,
  caller: Caller,
) -> Result<StatusCode, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let ctx = access::authorize(&state.store, Some(caller.principal)).await?;
  let profile = ctx.require_approved()?;
  state
    .reservations
    .unregister(event_id, profile.principal_id)
    .await?;
  Ok(StatusCode::NO_CONTENT)
}
