//! The `CommunityStore` trait and supporting outcome types.
//!
//! The trait is implemented by storage backends (e.g. `quorum-store-sqlite`).
//! Higher layers (`quorum-engine`, `quorum-api`) depend on this abstraction,
//! not on any concrete backend.
//!
//! Expected-domain outcomes (event full, row missing, write was a no-op)
//! are carried in return types. `Self::Error` is reserved for infrastructure
//! failures, which the engine layer maps to `Error::Unavailable` and fails
//! closed.

use std::future::Future;

use uuid::Uuid;

use crate::{
  audit::{AuditEntry, IncomeTransaction, NewAuditEntry, NewIncomeTransaction},
  event::{Event, NewEvent, Rsvp, RsvpStatus},
  feed::{Comment, NewComment, NewPost, Post},
  profile::{MembershipStatus, NewProfile, Profile, ProfilePatch, Role, StatField},
};

// ─── Outcome types ───────────────────────────────────────────────────────────

/// Result of a capacity reservation attempt, decided inside a single store
/// transaction so a concurrent racer cannot push past capacity.
#[derive(Debug, Clone)]
pub enum ReserveOutcome {
  /// A new RSVP row was written and the counter incremented.
  Reserved(Rsvp),
  /// The principal already held a row; its status was upserted and the
  /// counter left alone.
  Updated(Rsvp),
  /// The event is at `capacity`; nothing was written.
  Full { capacity: u32 },
  NoSuchEvent,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the Quorum document-store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CommunityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Create the profile document for a freshly-registered principal.
  /// Status starts `Pending`, role `Member`; `requested_at` is assigned by
  /// the store.
  fn create_profile(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Retrieve a profile by principal id. `None` if absent.
  fn profile(
    &self,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// List profiles, optionally filtered by membership status.
  fn list_profiles(
    &self,
    status: Option<MembershipStatus>,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  /// Merge subject-editable contact fields into the document. Returns
  /// `false` if the profile does not exist. Never overwrites the whole
  /// document.
  fn update_contact(
    &self,
    principal_id: Uuid,
    patch: ProfilePatch,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Merge-write the `role` field only. Returns `false` if absent.
  fn set_role(
    &self,
    principal_id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Merge-write the `status` field only. Returns `false` if absent.
  fn set_status(
    &self,
    principal_id: Uuid,
    status: MembershipStatus,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Merge-write the suspension flag. Returns `false` if absent.
  fn set_suspended(
    &self,
    principal_id: Uuid,
    suspended: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Stamp `last_login_at`. A missing profile is ignored.
  fn record_login(
    &self,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Atomically adjust one denormalized stat counter, clamped at zero.
  fn adjust_stat(
    &self,
    principal_id: Uuid,
    field: StatField,
    delta: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Suspension notices ────────────────────────────────────────────────

  /// Persist the human-readable reason shown on the principal's next
  /// unauthenticated visit. Overwrites any previous notice.
  fn put_suspension_notice<'a>(
    &'a self,
    principal_id: Uuid,
    message: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Consume the notice: returns it and deletes it, so display is one-shot.
  fn take_suspension_notice(
    &self,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// Delete any pending notice without reading it (used when a suspension
  /// is lifted before the member returns).
  fn clear_suspension_notice(
    &self,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Events & reservations ─────────────────────────────────────────────

  fn create_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn event(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// All events ordered by start time ascending.
  fn list_events(
    &self,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  /// Delete the event document only. RSVP cascade is the engine's saga.
  fn delete_event(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Reserve a seat: in one transaction, re-check capacity, upsert the
  /// RSVP row, and increment `registration_count` iff a new row was
  /// written.
  fn reserve(
    &self,
    event_id: Uuid,
    principal_id: Uuid,
    status: RsvpStatus,
  ) -> impl Future<Output = Result<ReserveOutcome, Self::Error>> + Send + '_;

  /// Remove the RSVP row and decrement the counter. Returns `false` (and
  /// changes nothing) if no row existed; idempotent.
  fn release(
    &self,
    event_id: Uuid,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn rsvp(
    &self,
    event_id: Uuid,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<Option<Rsvp>, Self::Error>> + Send + '_;

  fn event_rsvps(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Rsvp>, Self::Error>> + Send + '_;

  /// All RSVP rows for a principal across every event — a scatter read,
  /// acceptable at this scale.
  fn rsvps_for_principal(
    &self,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Rsvp>, Self::Error>> + Send + '_;

  // ── Feed ──────────────────────────────────────────────────────────────

  fn create_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  fn post(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// All posts, newest first.
  fn list_posts(
    &self,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  fn delete_post(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Create or delete the per-principal like row, adjusting `likes_count`
  /// in the same transaction iff the row set actually changed.
  ///
  /// Returns `None` if the post does not exist, otherwise `Some(changed)`.
  /// A repeated like is `Some(false)`: no second row, no second increment.
  fn set_like(
    &self,
    post_id: Uuid,
    principal_id: Uuid,
    liked: bool,
  ) -> impl Future<Output = Result<Option<bool>, Self::Error>> + Send + '_;

  fn has_liked(
    &self,
    post_id: Uuid,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Append a comment and bump `comment_count` in the same transaction.
  /// Returns `None` if the post does not exist.
  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Comments for a post, oldest first.
  fn comments(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// Delete one comment, decrementing its post's counter. Replies that
  /// reference it stay behind.
  fn delete_comment(
    &self,
    comment_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Batch-delete every comment on a post; returns how many went.
  fn delete_post_comments(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Audit & income ────────────────────────────────────────────────────

  /// Append an audit entry. The store assigns id and timestamp; entries
  /// are never mutated or deleted.
  fn append_audit(
    &self,
    input: NewAuditEntry,
  ) -> impl Future<Output = Result<AuditEntry, Self::Error>> + Send + '_;

  /// Most recent entries first, capped at `limit`.
  fn audit_log(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<AuditEntry>, Self::Error>> + Send + '_;

  fn record_income(
    &self,
    input: NewIncomeTransaction,
    recorded_by: Uuid,
  ) -> impl Future<Output = Result<IncomeTransaction, Self::Error>> + Send + '_;

  /// Most recent transactions first.
  fn income_transactions(
    &self,
  ) -> impl Future<Output = Result<Vec<IncomeTransaction>, Self::Error>> + Send + '_;
}
