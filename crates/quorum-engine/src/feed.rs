//! The feed interaction layer: posts, likes, and comments.
//!
//! Like and comment counters ride in the same store transaction as the
//! sub-record they count, so they cannot drift from the rows. Per-profile
//! stats stay best-effort, as with event registration.

use quorum_core::{
  Error, Result,
  feed::{Comment, NewComment, NewPost, Post},
  profile::StatField,
  store::CommunityStore,
};
use uuid::Uuid;

pub struct Feed<S> {
  store: S,
}

impl<S: CommunityStore> Feed<S> {
  pub fn new(store: S) -> Self {
    Feed { store }
  }

  pub async fn list_posts(&self) -> Result<Vec<Post>> {
    self.store.list_posts().await.map_err(Error::unavailable)
  }

  pub async fn post(&self, post_id: Uuid) -> Result<Post> {
    self
      .store
      .post(post_id)
      .await
      .map_err(Error::unavailable)?
      .ok_or_else(|| Error::NotFound(format!("post {post_id}")))
  }

  pub async fn create_post(&self, author_id: Uuid, body: String) -> Result<Post> {
    if body.trim().is_empty() {
      return Err(Error::InvalidArgument("post body must not be empty".into()));
    }
    let post = self
      .store
      .create_post(NewPost { author_id, body })
      .await
      .map_err(Error::unavailable)?;
    self.bump_stat(author_id, StatField::Posts, 1).await;
    Ok(post)
  }

  /// Set the caller's like state on a post. Returns the new state.
  ///
  /// A repeated like is a no-op: no second row, no second increment. The
  /// author's `likes` stat moves only when the like set actually changed.
  pub async fn set_like(
    &self,
    post_id: Uuid,
    principal_id: Uuid,
    liked: bool,
  ) -> Result<bool> {
    let post = self.post(post_id).await?;

    let changed = self
      .store
      .set_like(post_id, principal_id, liked)
      .await
      .map_err(Error::unavailable)?
      .ok_or_else(|| Error::NotFound(format!("post {post_id}")))?;

    if changed {
      let delta = if liked { 1 } else { -1 };
      self.bump_stat(post.author_id, StatField::Likes, delta).await;
    }
    Ok(liked)
  }

  /// Flip the caller's like on a post, returning the new state.
  pub async fn toggle_like(&self, post_id: Uuid, principal_id: Uuid) -> Result<bool> {
    let liked = self
      .store
      .has_liked(post_id, principal_id)
      .await
      .map_err(Error::unavailable)?;
    self.set_like(post_id, principal_id, !liked).await
  }

  pub async fn comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
    self.store.comments(post_id).await.map_err(Error::unavailable)
  }

  pub async fn add_comment(&self, input: NewComment) -> Result<Comment> {
    if input.body.trim().is_empty() {
      return Err(Error::InvalidArgument(
        "comment body must not be empty".into(),
      ));
    }
    self
      .store
      .add_comment(input)
      .await
      .map_err(Error::unavailable)?
      .ok_or_else(|| Error::NotFound("post".into()))
  }

  /// Remove one comment. Replies that referenced it stay behind, orphaned.
  pub async fn delete_comment(&self, comment_id: Uuid) -> Result<()> {
    if !self
      .store
      .delete_comment(comment_id)
      .await
      .map_err(Error::unavailable)?
    {
      return Err(Error::NotFound(format!("comment {comment_id}")));
    }
    Ok(())
  }

  /// Delete a post with its likes and, best-effort, its comments.
  ///
  /// A failed comment cascade is logged and the post deletion proceeds; an
  /// orphaned comment is preferable to an undeletable post.
  pub async fn delete_post(&self, post_id: Uuid) -> Result<()> {
    let post = self.post(post_id).await?;

    match self.store.delete_post_comments(post_id).await {
      Ok(removed) if removed > 0 => {
        tracing::debug!(post_id = %post_id, removed, "deleted post comments");
      }
      Ok(_) => {}
      Err(error) => {
        tracing::warn!(%error, post_id = %post_id, "comment cascade failed; deleting post anyway");
      }
    }

    self
      .store
      .delete_post(post_id)
      .await
      .map_err(Error::unavailable)?;
    self.bump_stat(post.author_id, StatField::Posts, -1).await;
    Ok(())
  }

  async fn bump_stat(&self, principal_id: Uuid, field: StatField, delta: i64) {
    if let Err(error) = self.store.adjust_stat(principal_id, field, delta).await {
      tracing::warn!(%error, principal_id = %principal_id, "stat adjustment failed");
    }
  }
}
