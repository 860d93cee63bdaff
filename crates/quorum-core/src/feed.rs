//! Feed types: posts with denormalized counters, likes, comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
  pub post_id:       Uuid,
  pub author_id:     Uuid,
  pub body:          String,
  /// Cached cardinality of the like rows; may drift, never authoritative.
  pub likes_count:   u32,
  pub comment_count: u32,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
  pub author_id: Uuid,
  pub body:      String,
}

/// Comments are top-level records referencing their post. A reply carries
/// `parent_comment_id`; deleting the parent leaves replies orphaned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id:        Uuid,
  pub post_id:           Uuid,
  pub author_id:         Uuid,
  pub parent_comment_id: Option<Uuid>,
  pub body:              String,
  pub created_at:        DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
  pub post_id:           Uuid,
  pub author_id:         Uuid,
  pub parent_comment_id: Option<Uuid>,
  pub body:              String,
}
