//! Bearer-token extractors resolving the calling principal.

use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts},
};
use quorum_core::{Error, Principal, identity::IdentityProvider, store::CommunityStore};

use crate::{AppState, error::ApiError};

/// An authenticated caller: the resolved principal plus the raw token (kept
/// for logout).
pub struct Caller {
  pub principal: Principal,
  pub token:     String,
}

/// A caller that may be signed out. Handlers that serve guests too (e.g.
/// `/me`) use this instead of [`Caller`].
pub struct MaybeCaller(pub Option<Caller>);

fn bearer_token(parts: &Parts) -> Option<String> {
  parts
    .headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::to_owned)
}

async fn resolve<I, S>(
  parts: &Parts,
  state: &AppState<I, S>,
) -> Result<Option<Caller>, ApiError>
where
  I: IdentityProvider,
  S: CommunityStore,
{
  let Some(token) = bearer_token(parts) else {
    return Ok(None);
  };
  let principal = state
    .identity
    .authenticate(&token)
    .await
    .map_err(Error::unavailable)?;
  Ok(principal.map(|principal| Caller { principal, token }))
}

impl<I, S> FromRequestParts<AppState<I, S>> for Caller
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<I, S>,
  ) -> Result<Self, Self::Rejection> {
    resolve(parts, state)
      .await?
      .ok_or(ApiError(Error::Unauthenticated))
  }
}

impl<I, S> FromRequestParts<AppState<I, S>> for MaybeCaller
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<I, S>,
  ) -> Result<Self, Self::Rejection> {
    // An invalid or revoked token degrades to guest rather than erroring;
    // guarded handlers use `Caller` and reject instead.
    Ok(MaybeCaller(resolve(parts, state).await?))
  }
}
