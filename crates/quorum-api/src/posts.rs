//! Handlers for the member feed: posts, likes, comments.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use quorum_core::{
  Error,
  feed::{Comment, NewComment, Post},
  identity::IdentityProvider,
  store::CommunityStore,
};
use quorum_engine::{AccessState, access::{self, AccessContext}};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::Caller};

async fn approved_ctx<I, S>(
  state: &AppState<I, S>,
  caller: Caller,
) -> Result<AccessContext, ApiError>
where
  I: IdentityProvider,
  S: CommunityStore,
{
  let ctx = access::authorize(&state.store, Some(caller.principal)).await?;
  ctx.require_approved()?;
  Ok(ctx)
}

/// `GET /posts` — the feed, newest first.
pub async fn list<I, S>(
  State(state): State<AppState<I, S>>,
  caller: Caller,
) -> Result<Json<Vec<Post>>, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  approved_ctx(&state, caller).await?;
  Ok(Json(state.feed.list_posts().await?))
}

#[derive(Debug, Deserialize)]
pub struct CreatePostBody {
  pub body: String,
}

/// `POST /posts` — body: `{"body":"…"}`
pub async fn create<I, S>(
  State(state): State<AppState<I, S>>,
  caller: Caller,
  Json(body): Json<CreatePostBody>,
) -> Result<impl IntoResponse, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let ctx = approved_ctx(&state, caller).await?;
  let author = ctx.principal()?.principal_id;
  let post = state.feed.create_post(author, body.body).await?;
  Ok((StatusCode::CREATED, Json(post)))
}

/// `DELETE /posts/:id` — the author or an admin.
pub async fn delete_post<I, S>(
  State(state): State<AppState<I, S>>,
  Path(post_id): Path<Uuid>,
  caller: Caller,
) -> Result<StatusCode, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let ctx = approved_ctx(&state, caller).await?;
  let post = state.feed.post(post_id).await?;

  let is_author = post.author_id == ctx.principal()?.principal_id;
  if !is_author && ctx.state != AccessState::Admin {
    return Err(Error::PermissionDenied("not the author".into()).into());
  }

  state.feed.delete_post(post_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
  pub liked: bool,
}

/// `POST /posts/:id/like` — toggles the caller's like; returns the new state.
pub async fn like<I, S>(
  State(state): State<AppState<I, S>>,
  Path(post_id): Path<Uuid>,
  caller: Caller,
) -> Result<Json<LikeResponse>, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let ctx = approved_ctx(&state, caller).await?;
  let liked = state
    .feed
    .toggle_like(post_id, ctx.principal()?.principal_id)
    .await?;
  Ok(Json(LikeResponse { liked }))
}

/// `GET /posts/:id/comments`
pub async fn comments<I, S>(
  State(state): State<AppState<I, S>>,
  Path(post_id): Path<Uuid>,
  caller: Caller,
) -> Result<Json<Vec<Comment>>, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  approved_ctx(&state, caller).await?;
  Ok(Json(state.feed.comments(post_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub body:              String,
  pub parent_comment_id: Option<Uuid>,
}

/// `POST /posts/:id/comments`
pub async fn comment<I, S>(
  State(state): State<AppState<I, S>>,
  Path(post_id): Path<Uuid>,
  caller: Caller,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let ctx = approved_ctx(&state, caller).await?;
  let comment = state
    .feed
    .add_comment(NewComment {
      post_id,
      author_id:         ctx.principal()?.principal_id,
      parent_comment_id: body.parent_comment_id,
      body:              body.body,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(comment)))
}

/// `DELETE /comments/:id` — admins only; comments have no cheap author
/// lookup by id.
pub async fn delete_comment<I, S>(
  State(state): State<AppState<I, S>>,
  Path(comment_id): Path<Uuid>,
  caller: Caller,
) -> Result<StatusCode, ApiError>
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  let ctx = access::authorize(&state.store, Some(caller.principal)).await?;
  ctx.require_admin()?;
  state.feed.delete_comment(comment_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
