//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use quorum_core::{
  audit::{NewAuditEntry, NewIncomeTransaction},
  event::{NewEvent, RsvpStatus},
  feed::{NewComment, NewPost},
  profile::{MembershipStatus, NewProfile, ProfilePatch, Role, StatField},
  store::{CommunityStore, ReserveOutcome},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_profile(name: &str) -> NewProfile {
  NewProfile {
    principal_id: Uuid::new_v4(),
    name:         name.into(),
    email:        format!("{}@example.com", name.to_lowercase()),
    phone:        None,
    bio:          None,
  }
}

fn new_event(max_participants: u32) -> NewEvent {
  NewEvent {
    title:            "Monthly meetup".into(),
    starts_at:        Utc::now() + Duration::days(7),
    location:         "Community hall".into(),
    description:      "Bring snacks.".into(),
    max_participants,
    created_by:       Uuid::new_v4(),
  }
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_profile() {
  let s = store().await;

  let created = s.create_profile(new_profile("Alice")).await.unwrap();
  assert_eq!(created.role, Role::Member);
  assert_eq!(created.status, MembershipStatus::Pending);
  assert!(!created.suspended);

  let fetched = s.profile(created.principal_id).await.unwrap().unwrap();
  assert_eq!(fetched.principal_id, created.principal_id);
  assert_eq!(fetched.name, "Alice");
  assert_eq!(fetched.email, "alice@example.com");
  assert!(fetched.last_login_at.is_none());
}

#[tokio::test]
async fn profile_missing_returns_none() {
  let s = store().await;
  assert!(s.profile(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_profiles_filtered_by_status() {
  let s = store().await;
  let a = s.create_profile(new_profile("Alice")).await.unwrap();
  let b = s.create_profile(new_profile("Bob")).await.unwrap();
  s.create_profile(new_profile("Carol")).await.unwrap();

  s.set_status(a.principal_id, MembershipStatus::Approved)
    .await
    .unwrap();
  s.set_status(b.principal_id, MembershipStatus::Approved)
    .await
    .unwrap();

  let approved = s
    .list_profiles(Some(MembershipStatus::Approved))
    .await
    .unwrap();
  assert_eq!(approved.len(), 2);
  assert!(
    approved
      .iter()
      .all(|p| p.status == MembershipStatus::Approved)
  );

  let all = s.list_profiles(None).await.unwrap();
  assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn update_contact_merges_only_provided_fields() {
  let s = store().await;
  let mut input = new_profile("Alice");
  input.phone = Some("555-0100".into());
  let p = s.create_profile(input).await.unwrap();

  let changed = s
    .update_contact(p.principal_id, ProfilePatch {
      name:  Some("Alice L".into()),
      phone: None,
      bio:   Some("Hi!".into()),
    })
    .await
    .unwrap();
  assert!(changed);

  let fetched = s.profile(p.principal_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Alice L");
  assert_eq!(fetched.phone.as_deref(), Some("555-0100"));
  assert_eq!(fetched.bio.as_deref(), Some("Hi!"));
}

#[tokio::test]
async fn set_role_and_suspend() {
  let s = store().await;
  let p = s.create_profile(new_profile("Alice")).await.unwrap();

  assert!(s.set_role(p.principal_id, Role::Admin).await.unwrap());
  assert!(s.set_suspended(p.principal_id, true).await.unwrap());

  let fetched = s.profile(p.principal_id).await.unwrap().unwrap();
  assert_eq!(fetched.role, Role::Admin);
  assert!(fetched.suspended);

  // Unknown principals report no rows changed.
  assert!(!s.set_role(Uuid::new_v4(), Role::Admin).await.unwrap());
}

#[tokio::test]
async fn adjust_stat_clamps_at_zero() {
  let s = store().await;
  let p = s.create_profile(new_profile("Alice")).await.unwrap();

  s.adjust_stat(p.principal_id, StatField::Posts, 2)
    .await
    .unwrap();
  s.adjust_stat(p.principal_id, StatField::Posts, -5)
    .await
    .unwrap();

  let fetched = s.profile(p.principal_id).await.unwrap().unwrap();
  assert_eq!(fetched.stats.posts, 0);
}

#[tokio::test]
async fn record_login_sets_timestamp() {
  let s = store().await;
  let p = s.create_profile(new_profile("Alice")).await.unwrap();

  s.record_login(p.principal_id).await.unwrap();
  let fetched = s.profile(p.principal_id).await.unwrap().unwrap();
  assert!(fetched.last_login_at.is_some());
}

// ─── Suspension notices ──────────────────────────────────────────────────────

#[tokio::test]
async fn suspension_notice_is_consumed_on_read() {
  let s = store().await;
  let id = Uuid::new_v4();

  s.put_suspension_notice(id, "account suspended").await.unwrap();

  let first = s.take_suspension_notice(id).await.unwrap();
  assert_eq!(first.as_deref(), Some("account suspended"));

  let second = s.take_suspension_notice(id).await.unwrap();
  assert!(second.is_none());
}

#[tokio::test]
async fn clear_suspension_notice_discards_unread() {
  let s = store().await;
  let id = Uuid::new_v4();

  s.put_suspension_notice(id, "account suspended").await.unwrap();
  s.clear_suspension_notice(id).await.unwrap();

  assert!(s.take_suspension_notice(id).await.unwrap().is_none());
}

// ─── Events & reservations ───────────────────────────────────────────────────

#[tokio::test]
async fn reserve_up_to_capacity_then_full() {
  let s = store().await;
  let event = s.create_event(new_event(2)).await.unwrap();

  let first = s
    .reserve(event.event_id, Uuid::new_v4(), RsvpStatus::Going)
    .await
    .unwrap();
  assert!(matches!(first, ReserveOutcome::Reserved(_)));

  let second = s
    .reserve(event.event_id, Uuid::new_v4(), RsvpStatus::Going)
    .await
    .unwrap();
  assert!(matches!(second, ReserveOutcome::Reserved(_)));

  let third = s
    .reserve(event.event_id, Uuid::new_v4(), RsvpStatus::Going)
    .await
    .unwrap();
  assert!(matches!(third, ReserveOutcome::Full { capacity: 2 }));

  let fetched = s.event(event.event_id).await.unwrap().unwrap();
  assert_eq!(fetched.registration_count, 2);
}

#[tokio::test]
async fn reserve_unlimited_event_never_fills() {
  let s = store().await;
  let event = s.create_event(new_event(0)).await.unwrap();

  for _ in 0..5 {
    let outcome = s
      .reserve(event.event_id, Uuid::new_v4(), RsvpStatus::Going)
      .await
      .unwrap();
    assert!(matches!(outcome, ReserveOutcome::Reserved(_)));
  }

  let fetched = s.event(event.event_id).await.unwrap().unwrap();
  assert_eq!(fetched.registration_count, 5);
}

#[tokio::test]
async fn reserve_existing_updates_without_counting_twice() {
  let s = store().await;
  let event = s.create_event(new_event(1)).await.unwrap();
  let member = Uuid::new_v4();

  let first = s
    .reserve(event.event_id, member, RsvpStatus::Interested)
    .await
    .unwrap();
  assert!(matches!(first, ReserveOutcome::Reserved(_)));

  // Same member switching status reuses the existing seat, even at capacity.
  let second = s
    .reserve(event.event_id, member, RsvpStatus::Going)
    .await
    .unwrap();
  assert!(matches!(second, ReserveOutcome::Updated(_)));

  let fetched = s.event(event.event_id).await.unwrap().unwrap();
  assert_eq!(fetched.registration_count, 1);

  let rsvp = s.rsvp(event.event_id, member).await.unwrap().unwrap();
  assert_eq!(rsvp.status, RsvpStatus::Going);
}

#[tokio::test]
async fn concurrent_reserves_never_exceed_capacity() {
  let s = store().await;
  let event = s.create_event(new_event(3)).await.unwrap();

  let mut tasks = Vec::new();
  for _ in 0..10 {
    let s = s.clone();
    let event_id = event.event_id;
    tasks.push(tokio::spawn(async move {
      s.reserve(event_id, Uuid::new_v4(), RsvpStatus::Going).await
    }));
  }

  let mut reserved = 0;
  let mut full = 0;
  for task in tasks {
    match task.await.unwrap().unwrap() {
      ReserveOutcome::Reserved(_) => reserved += 1,
      ReserveOutcome::Full { capacity: 3 } => full += 1,
      other => panic!("unexpected outcome {other:?}"),
    }
  }
  assert_eq!(reserved, 3);
  assert_eq!(full, 7);

  let fetched = s.event(event.event_id).await.unwrap().unwrap();
  assert_eq!(fetched.registration_count, 3);
}

#[tokio::test]
async fn reserve_unknown_event() {
  let s = store().await;
  let outcome = s
    .reserve(Uuid::new_v4(), Uuid::new_v4(), RsvpStatus::Going)
    .await
    .unwrap();
  assert!(matches!(outcome, ReserveOutcome::NoSuchEvent));
}

#[tokio::test]
async fn release_frees_a_seat() {
  let s = store().await;
  let event = s.create_event(new_event(1)).await.unwrap();
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();

  s.reserve(event.event_id, alice, RsvpStatus::Going)
    .await
    .unwrap();
  let full = s.reserve(event.event_id, bob, RsvpStatus::Going).await.unwrap();
  assert!(matches!(full, ReserveOutcome::Full { .. }));

  assert!(s.release(event.event_id, alice).await.unwrap());

  let reclaimed = s.reserve(event.event_id, bob, RsvpStatus::Going).await.unwrap();
  assert!(matches!(reclaimed, ReserveOutcome::Reserved(_)));

  // Releasing an absent reservation is a no-op and must not touch the count.
  assert!(!s.release(event.event_id, alice).await.unwrap());
  let fetched = s.event(event.event_id).await.unwrap().unwrap();
  assert_eq!(fetched.registration_count, 1);
}

#[tokio::test]
async fn list_events_ordered_by_start() {
  let s = store().await;

  let mut later = new_event(0);
  later.starts_at = Utc::now() + Duration::days(30);
  let mut sooner = new_event(0);
  sooner.starts_at = Utc::now() + Duration::days(1);

  let later = s.create_event(later).await.unwrap();
  let sooner = s.create_event(sooner).await.unwrap();

  let events = s.list_events().await.unwrap();
  assert_eq!(events.len(), 2);
  assert_eq!(events[0].event_id, sooner.event_id);
  assert_eq!(events[1].event_id, later.event_id);
}

#[tokio::test]
async fn rsvps_for_principal_spans_events() {
  let s = store().await;
  let a = s.create_event(new_event(0)).await.unwrap();
  let b = s.create_event(new_event(0)).await.unwrap();
  let member = Uuid::new_v4();

  s.reserve(a.event_id, member, RsvpStatus::Going).await.unwrap();
  s.reserve(b.event_id, member, RsvpStatus::Interested)
    .await
    .unwrap();
  s.reserve(b.event_id, Uuid::new_v4(), RsvpStatus::Going)
    .await
    .unwrap();

  let mine = s.rsvps_for_principal(member).await.unwrap();
  assert_eq!(mine.len(), 2);

  let attendees = s.event_rsvps(b.event_id).await.unwrap();
  assert_eq!(attendees.len(), 2);
}

#[tokio::test]
async fn delete_event_removes_row() {
  let s = store().await;
  let event = s.create_event(new_event(0)).await.unwrap();

  assert!(s.delete_event(event.event_id).await.unwrap());
  assert!(s.event(event.event_id).await.unwrap().is_none());
  assert!(!s.delete_event(event.event_id).await.unwrap());
}

// ─── Feed ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn like_twice_counts_once() {
  let s = store().await;
  let post = s
    .create_post(NewPost { author_id: Uuid::new_v4(), body: "hello".into() })
    .await
    .unwrap();
  let member = Uuid::new_v4();

  let first = s.set_like(post.post_id, member, true).await.unwrap();
  assert_eq!(first, Some(true));
  let second = s.set_like(post.post_id, member, true).await.unwrap();
  assert_eq!(second, Some(false));

  let fetched = s.post(post.post_id).await.unwrap().unwrap();
  assert_eq!(fetched.likes_count, 1);
  assert!(s.has_liked(post.post_id, member).await.unwrap());
}

#[tokio::test]
async fn unlike_restores_count() {
  let s = store().await;
  let post = s
    .create_post(NewPost { author_id: Uuid::new_v4(), body: "hello".into() })
    .await
    .unwrap();
  let member = Uuid::new_v4();

  s.set_like(post.post_id, member, true).await.unwrap();
  let removed = s.set_like(post.post_id, member, false).await.unwrap();
  assert_eq!(removed, Some(true));

  // Unliking again changes nothing.
  let again = s.set_like(post.post_id, member, false).await.unwrap();
  assert_eq!(again, Some(false));

  let fetched = s.post(post.post_id).await.unwrap().unwrap();
  assert_eq!(fetched.likes_count, 0);
  assert!(!s.has_liked(post.post_id, member).await.unwrap());
}

#[tokio::test]
async fn like_unknown_post_returns_none() {
  let s = store().await;
  let outcome = s
    .set_like(Uuid::new_v4(), Uuid::new_v4(), true)
    .await
    .unwrap();
  assert!(outcome.is_none());
}

#[tokio::test]
async fn comments_maintain_post_counter() {
  let s = store().await;
  let post = s
    .create_post(NewPost { author_id: Uuid::new_v4(), body: "hello".into() })
    .await
    .unwrap();

  let c1 = s
    .add_comment(NewComment {
      post_id:           post.post_id,
      author_id:         Uuid::new_v4(),
      parent_comment_id: None,
      body:              "first".into(),
    })
    .await
    .unwrap()
    .unwrap();
  s.add_comment(NewComment {
    post_id:           post.post_id,
    author_id:         Uuid::new_v4(),
    parent_comment_id: Some(c1.comment_id),
    body:              "reply".into(),
  })
  .await
  .unwrap()
  .unwrap();

  let fetched = s.post(post.post_id).await.unwrap().unwrap();
  assert_eq!(fetched.comment_count, 2);

  assert!(s.delete_comment(c1.comment_id).await.unwrap());
  let fetched = s.post(post.post_id).await.unwrap().unwrap();
  assert_eq!(fetched.comment_count, 1);

  // The reply survives its parent.
  let remaining = s.comments(post.post_id).await.unwrap();
  assert_eq!(remaining.len(), 1);
  assert_eq!(remaining[0].parent_comment_id, Some(c1.comment_id));
}

#[tokio::test]
async fn comment_on_unknown_post_returns_none() {
  let s = store().await;
  let outcome = s
    .add_comment(NewComment {
      post_id:           Uuid::new_v4(),
      author_id:         Uuid::new_v4(),
      parent_comment_id: None,
      body:              "lost".into(),
    })
    .await
    .unwrap();
  assert!(outcome.is_none());
}

#[tokio::test]
async fn delete_post_comments_clears_counter() {
  let s = store().await;
  let post = s
    .create_post(NewPost { author_id: Uuid::new_v4(), body: "hello".into() })
    .await
    .unwrap();
  for i in 0..3 {
    s.add_comment(NewComment {
      post_id:           post.post_id,
      author_id:         Uuid::new_v4(),
      parent_comment_id: None,
      body:              format!("comment {i}"),
    })
    .await
    .unwrap()
    .unwrap();
  }

  let removed = s.delete_post_comments(post.post_id).await.unwrap();
  assert_eq!(removed, 3);

  let fetched = s.post(post.post_id).await.unwrap().unwrap();
  assert_eq!(fetched.comment_count, 0);
  assert!(s.comments(post.post_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_posts_newest_first() {
  let s = store().await;
  let author = Uuid::new_v4();
  s.create_post(NewPost { author_id: author, body: "one".into() })
    .await
    .unwrap();
  s.create_post(NewPost { author_id: author, body: "two".into() })
    .await
    .unwrap();

  let posts = s.list_posts().await.unwrap();
  assert_eq!(posts.len(), 2);
  assert!(posts[0].created_at >= posts[1].created_at);
}

#[tokio::test]
async fn delete_post_removes_likes() {
  let s = store().await;
  let post = s
    .create_post(NewPost { author_id: Uuid::new_v4(), body: "hello".into() })
    .await
    .unwrap();
  let member = Uuid::new_v4();
  s.set_like(post.post_id, member, true).await.unwrap();

  assert!(s.delete_post(post.post_id).await.unwrap());
  assert!(s.post(post.post_id).await.unwrap().is_none());
  assert!(!s.has_liked(post.post_id, member).await.unwrap());
}

// ─── Audit & income ──────────────────────────────────────────────────────────

#[tokio::test]
async fn audit_log_returns_newest_entries() {
  let s = store().await;
  let admin = Uuid::new_v4();

  for action in ["approve_member", "suspend_member", "set_role"] {
    s.append_audit(NewAuditEntry {
      action:       action.into(),
      performed_by: admin,
      target_id:    Some(Uuid::new_v4()),
      changes:      serde_json::json!({ "action": action }),
    })
    .await
    .unwrap();
  }

  let entries = s.audit_log(2).await.unwrap();
  assert_eq!(entries.len(), 2);
  assert!(entries[0].created_at >= entries[1].created_at);

  let all = s.audit_log(10).await.unwrap();
  assert_eq!(all.len(), 3);
  assert!(all.iter().all(|e| e.performed_by == admin));
}

#[tokio::test]
async fn record_income_roundtrip() {
  let s = store().await;
  let admin = Uuid::new_v4();

  let tx = s
    .record_income(
      NewIncomeTransaction {
        amount_cents: 2500,
        method:       "bank_transfer".into(),
        purpose:      "membership_dues".into(),
        category:     "dues".into(),
        description:  Some("August dues".into()),
      },
      admin,
    )
    .await
    .unwrap();
  assert_eq!(tx.recorded_by, admin);

  let listed = s.income_transactions().await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].amount_cents, 2500);
  assert_eq!(listed[0].description.as_deref(), Some("August dues"));
}
