//! [`SqliteStore`] — the SQLite implementation of [`CommunityStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use quorum_core::{
  audit::{AuditEntry, IncomeTransaction, NewAuditEntry, NewIncomeTransaction},
  event::{Event, EventStatus, NewEvent, Rsvp, RsvpStatus},
  feed::{Comment, NewComment, NewPost, Post},
  profile::{
    MembershipStatus, NewProfile, Profile, ProfilePatch, ProfileStats, Role,
    StatField,
  },
  store::{CommunityStore, ReserveOutcome},
};

use crate::{
  encode::{
    RawAuditEntry, RawComment, RawEvent, RawIncomeTransaction, RawPost,
    RawProfile, RawRsvp, encode_dt, encode_event_status, encode_role,
    encode_rsvp_status, encode_status, encode_uuid, stat_column,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Quorum community store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn profile_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawProfile> {
  Ok(RawProfile {
    principal_id:  row.get(0)?,
    role:          row.get(1)?,
    status:        row.get(2)?,
    suspended:     row.get(3)?,
    name:          row.get(4)?,
    email:         row.get(5)?,
    phone:         row.get(6)?,
    bio:           row.get(7)?,
    posts:         row.get(8)?,
    likes:         row.get(9)?,
    events:        row.get(10)?,
    connections:   row.get(11)?,
    requested_at:  row.get(12)?,
    last_login_at: row.get(13)?,
  })
}

const PROFILE_COLUMNS: &str = "principal_id, role, status, suspended, name, \
   email, phone, bio, posts, likes, events, connections, requested_at, \
   last_login_at";

fn event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEvent> {
  Ok(RawEvent {
    event_id:           row.get(0)?,
    title:              row.get(1)?,
    starts_at:          row.get(2)?,
    location:           row.get(3)?,
    description:        row.get(4)?,
    max_participants:   row.get(5)?,
    registration_count: row.get(6)?,
    status:             row.get(7)?,
    created_by:         row.get(8)?,
    created_at:         row.get(9)?,
  })
}

const EVENT_COLUMNS: &str = "event_id, title, starts_at, location, \
   description, max_participants, registration_count, status, created_by, \
   created_at";

fn rsvp_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRsvp> {
  Ok(RawRsvp {
    event_id:     row.get(0)?,
    principal_id: row.get(1)?,
    status:       row.get(2)?,
    updated_at:   row.get(3)?,
  })
}

// ─── CommunityStore impl ─────────────────────────────────────────────────────

impl CommunityStore for SqliteStore {
  type Error = Error;

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn create_profile(&self, input: NewProfile) -> Result<Profile> {
    let profile = Profile {
      principal_id:  input.principal_id,
      role:          Role::Member,
      status:        MembershipStatus::Pending,
      suspended:     false,
      name:          input.name,
      email:         input.email,
      phone:         input.phone,
      bio:           input.bio,
      stats:         ProfileStats::default(),
      requested_at:  Utc::now(),
      last_login_at: None,
    };

    let id_str   = encode_uuid(profile.principal_id);
    let at_str   = encode_dt(profile.requested_at);
    let name     = profile.name.clone();
    let email    = profile.email.clone();
    let phone    = profile.phone.clone();
    let bio      = profile.bio.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (principal_id, name, email, phone, bio, requested_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, email, phone, bio, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(profile)
  }

  async fn profile(&self, principal_id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(principal_id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE principal_id = ?1"
              ),
              rusqlite::params![id_str],
              profile_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn list_profiles(
    &self,
    status: Option<MembershipStatus>,
  ) -> Result<Vec<Profile>> {
    let status_str = status.map(encode_status).map(str::to_owned);

    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(s) = status_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE status = ?1
             ORDER BY requested_at"
          ))?;
          stmt
            .query_map(rusqlite::params![s], profile_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY requested_at"
          ))?;
          stmt
            .query_map([], profile_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  async fn update_contact(
    &self,
    principal_id: Uuid,
    patch: ProfilePatch,
  ) -> Result<bool> {
    let id_str = encode_uuid(principal_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET
             name  = COALESCE(?2, name),
             phone = COALESCE(?3, phone),
             bio   = COALESCE(?4, bio)
           WHERE principal_id = ?1",
          rusqlite::params![id_str, patch.name, patch.phone, patch.bio],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn set_role(&self, principal_id: Uuid, role: Role) -> Result<bool> {
    let id_str   = encode_uuid(principal_id);
    let role_str = encode_role(role).to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET role = ?2 WHERE principal_id = ?1",
          rusqlite::params![id_str, role_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn set_status(
    &self,
    principal_id: Uuid,
    status: MembershipStatus,
  ) -> Result<bool> {
    let id_str     = encode_uuid(principal_id);
    let status_str = encode_status(status).to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET status = ?2 WHERE principal_id = ?1",
          rusqlite::params![id_str, status_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn set_suspended(&self, principal_id: Uuid, suspended: bool) -> Result<bool> {
    let id_str = encode_uuid(principal_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET suspended = ?2 WHERE principal_id = ?1",
          rusqlite::params![id_str, suspended],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn record_login(&self, principal_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(principal_id);
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE profiles SET last_login_at = ?2 WHERE principal_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn adjust_stat(
    &self,
    principal_id: Uuid,
    field: StatField,
    delta: i64,
  ) -> Result<()> {
    let id_str = encode_uuid(principal_id);
    let column = stat_column(field);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "UPDATE profiles SET {column} = MAX({column} + ?2, 0)
             WHERE principal_id = ?1"
          ),
          rusqlite::params![id_str, delta],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Suspension notices ────────────────────────────────────────────────────

  async fn put_suspension_notice(
    &self,
    principal_id: Uuid,
    message: &str,
  ) -> Result<()> {
    let id_str  = encode_uuid(principal_id);
    let at_str  = encode_dt(Utc::now());
    let message = message.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO suspension_notices (principal_id, message, created_at)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (principal_id) DO UPDATE
             SET message = excluded.message, created_at = excluded.created_at",
          rusqlite::params![id_str, message, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn take_suspension_notice(
    &self,
    principal_id: Uuid,
  ) -> Result<Option<String>> {
    let id_str = encode_uuid(principal_id);

    let message = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let message: Option<String> = tx
          .query_row(
            "SELECT message FROM suspension_notices WHERE principal_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        if message.is_some() {
          tx.execute(
            "DELETE FROM suspension_notices WHERE principal_id = ?1",
            rusqlite::params![id_str],
          )?;
        }
        tx.commit()?;
        Ok(message)
      })
      .await?;

    Ok(message)
  }

  async fn clear_suspension_notice(&self, principal_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(principal_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM suspension_notices WHERE principal_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Events & reservations ─────────────────────────────────────────────────

  async fn create_event(&self, input: NewEvent) -> Result<Event> {
    let event = Event {
      event_id:           Uuid::new_v4(),
      title:              input.title,
      starts_at:          input.starts_at,
      location:           input.location,
      description:        input.description,
      max_participants:   input.max_participants,
      registration_count: 0,
      status:             EventStatus::Upcoming,
      created_by:         input.created_by,
      created_at:         Utc::now(),
    };

    let id_str       = encode_uuid(event.event_id);
    let title        = event.title.clone();
    let starts_str   = encode_dt(event.starts_at);
    let location     = event.location.clone();
    let description  = event.description.clone();
    let max          = event.max_participants as i64;
    let status_str   = encode_event_status(event.status).to_owned();
    let creator_str  = encode_uuid(event.created_by);
    let created_str  = encode_dt(event.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (
             event_id, title, starts_at, location, description,
             max_participants, status, created_by, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            title,
            starts_str,
            location,
            description,
            max,
            status_str,
            creator_str,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(event)
  }

  async fn event(&self, event_id: Uuid) -> Result<Option<Event>> {
    let id_str = encode_uuid(event_id);

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
              rusqlite::params![id_str],
              event_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_events(&self) -> Result<Vec<Event>> {
    let raws: Vec<RawEvent> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM events ORDER BY starts_at"
        ))?;
        let rows = stmt
          .query_map([], event_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn delete_event(&self, event_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(event_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM events WHERE event_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn reserve(
    &self,
    event_id: Uuid,
    principal_id: Uuid,
    status: RsvpStatus,
  ) -> Result<ReserveOutcome> {
    enum Raw {
      Reserved,
      Updated,
      Full(u32),
      NoSuchEvent,
    }

    let ev_str     = encode_uuid(event_id);
    let p_str      = encode_uuid(principal_id);
    let status_str = encode_rsvp_status(status).to_owned();
    let now        = Utc::now();
    let now_str    = encode_dt(now);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Capacity is re-checked under the transaction, so a concurrent
        // registration cannot push past the limit.
        let counts: Option<(i64, i64)> = tx
          .query_row(
            "SELECT max_participants, registration_count
             FROM events WHERE event_id = ?1",
            rusqlite::params![ev_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        let Some((max, count)) = counts else {
          return Ok(Raw::NoSuchEvent);
        };

        let existing: bool = tx
          .query_row(
            "SELECT 1 FROM rsvps WHERE event_id = ?1 AND principal_id = ?2",
            rusqlite::params![ev_str, p_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if existing {
          // Status upsert only; the row already counts toward capacity.
          tx.execute(
            "UPDATE rsvps SET status = ?3, updated_at = ?4
             WHERE event_id = ?1 AND principal_id = ?2",
            rusqlite::params![ev_str, p_str, status_str, now_str],
          )?;
          tx.commit()?;
          return Ok(Raw::Updated);
        }

        if max > 0 && count >= max {
          return Ok(Raw::Full(max.max(0) as u32));
        }

        tx.execute(
          "INSERT INTO rsvps (event_id, principal_id, status, updated_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![ev_str, p_str, status_str, now_str],
        )?;
        tx.execute(
          "UPDATE events SET registration_count = registration_count + 1
           WHERE event_id = ?1",
          rusqlite::params![ev_str],
        )?;
        tx.commit()?;
        Ok(Raw::Reserved)
      })
      .await?;

    let rsvp = Rsvp { event_id, principal_id, status, updated_at: now };
    Ok(match raw {
      Raw::Reserved       => ReserveOutcome::Reserved(rsvp),
      Raw::Updated        => ReserveOutcome::Updated(rsvp),
      Raw::Full(capacity) => ReserveOutcome::Full { capacity },
      Raw::NoSuchEvent    => ReserveOutcome::NoSuchEvent,
    })
  }

  async fn release(&self, event_id: Uuid, principal_id: Uuid) -> Result<bool> {
    let ev_str = encode_uuid(event_id);
    let p_str  = encode_uuid(principal_id);

    let released = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let removed = tx.execute(
          "DELETE FROM rsvps WHERE event_id = ?1 AND principal_id = ?2",
          rusqlite::params![ev_str, p_str],
        )?;
        if removed > 0 {
          tx.execute(
            "UPDATE events SET registration_count = MAX(registration_count - 1, 0)
             WHERE event_id = ?1",
            rusqlite::params![ev_str],
          )?;
        }
        tx.commit()?;
        Ok(removed > 0)
      })
      .await?;

    Ok(released)
  }

  async fn rsvp(&self, event_id: Uuid, principal_id: Uuid) -> Result<Option<Rsvp>> {
    let ev_str = encode_uuid(event_id);
    let p_str  = encode_uuid(principal_id);

    let raw: Option<RawRsvp> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT event_id, principal_id, status, updated_at
               FROM rsvps WHERE event_id = ?1 AND principal_id = ?2",
              rusqlite::params![ev_str, p_str],
              rsvp_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRsvp::into_rsvp).transpose()
  }

  async fn event_rsvps(&self, event_id: Uuid) -> Result<Vec<Rsvp>> {
    let ev_str = encode_uuid(event_id);

    let raws: Vec<RawRsvp> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, principal_id, status, updated_at
           FROM rsvps WHERE event_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![ev_str], rsvp_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRsvp::into_rsvp).collect()
  }

  async fn rsvps_for_principal(&self, principal_id: Uuid) -> Result<Vec<Rsvp>> {
    let p_str = encode_uuid(principal_id);

    let raws: Vec<RawRsvp> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, principal_id, status, updated_at
           FROM rsvps WHERE principal_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![p_str], rsvp_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRsvp::into_rsvp).collect()
  }

  // ── Feed ──────────────────────────────────────────────────────────────────

  async fn create_post(&self, input: NewPost) -> Result<Post> {
    let post = Post {
      post_id:       Uuid::new_v4(),
      author_id:     input.author_id,
      body:          input.body,
      likes_count:   0,
      comment_count: 0,
      created_at:    Utc::now(),
    };

    let id_str     = encode_uuid(post.post_id);
    let author_str = encode_uuid(post.author_id);
    let body       = post.body.clone();
    let at_str     = encode_dt(post.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (post_id, author_id, body, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, author_str, body, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(post)
  }

  async fn post(&self, post_id: Uuid) -> Result<Option<Post>> {
    let id_str = encode_uuid(post_id);

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT post_id, author_id, body, likes_count, comment_count, created_at
               FROM posts WHERE post_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawPost {
                  post_id:       row.get(0)?,
                  author_id:     row.get(1)?,
                  body:          row.get(2)?,
                  likes_count:   row.get(3)?,
                  comment_count: row.get(4)?,
                  created_at:    row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn list_posts(&self) -> Result<Vec<Post>> {
    let raws: Vec<RawPost> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT post_id, author_id, body, likes_count, comment_count, created_at
           FROM posts ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawPost {
              post_id:       row.get(0)?,
              author_id:     row.get(1)?,
              body:          row.get(2)?,
              likes_count:   row.get(3)?,
              comment_count: row.get(4)?,
              created_at:    row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPost::into_post).collect()
  }

  async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(post_id);

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM likes WHERE post_id = ?1",
          rusqlite::params![id_str],
        )?;
        let removed = tx.execute(
          "DELETE FROM posts WHERE post_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn set_like(
    &self,
    post_id: Uuid,
    principal_id: Uuid,
    liked: bool,
  ) -> Result<Option<bool>> {
    let post_str = encode_uuid(post_id);
    let p_str    = encode_uuid(principal_id);
    let at_str   = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM posts WHERE post_id = ?1",
            rusqlite::params![post_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(None);
        }

        let changed = if liked {
          // INSERT OR IGNORE keeps a repeated like from creating a second
          // row; the counter moves only when a row was actually written.
          tx.execute(
            "INSERT OR IGNORE INTO likes (post_id, principal_id, created_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![post_str, p_str, at_str],
          )?
        } else {
          tx.execute(
            "DELETE FROM likes WHERE post_id = ?1 AND principal_id = ?2",
            rusqlite::params![post_str, p_str],
          )?
        };

        if changed > 0 {
          let delta = if liked { 1 } else { -1 };
          tx.execute(
            "UPDATE posts SET likes_count = MAX(likes_count + ?2, 0)
             WHERE post_id = ?1",
            rusqlite::params![post_str, delta],
          )?;
        }
        tx.commit()?;
        Ok(Some(changed > 0))
      })
      .await?;

    Ok(outcome)
  }

  async fn has_liked(&self, post_id: Uuid, principal_id: Uuid) -> Result<bool> {
    let post_str = encode_uuid(post_id);
    let p_str    = encode_uuid(principal_id);

    let liked = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM likes WHERE post_id = ?1 AND principal_id = ?2",
              rusqlite::params![post_str, p_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(liked)
  }

  async fn add_comment(&self, input: NewComment) -> Result<Option<Comment>> {
    let comment = Comment {
      comment_id:        Uuid::new_v4(),
      post_id:           input.post_id,
      author_id:         input.author_id,
      parent_comment_id: input.parent_comment_id,
      body:              input.body,
      created_at:        Utc::now(),
    };

    let id_str     = encode_uuid(comment.comment_id);
    let post_str   = encode_uuid(comment.post_id);
    let author_str = encode_uuid(comment.author_id);
    let parent_str = comment.parent_comment_id.map(encode_uuid);
    let body       = comment.body.clone();
    let at_str     = encode_dt(comment.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM posts WHERE post_id = ?1",
            rusqlite::params![post_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO comments (comment_id, post_id, author_id,
             parent_comment_id, body, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, post_str, author_str, parent_str, body, at_str],
        )?;
        tx.execute(
          "UPDATE posts SET comment_count = comment_count + 1
           WHERE post_id = ?1",
          rusqlite::params![post_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(inserted.then_some(comment))
  }

  async fn comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
    let post_str = encode_uuid(post_id);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT comment_id, post_id, author_id, parent_comment_id, body, created_at
           FROM comments WHERE post_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![post_str], |row| {
            Ok(RawComment {
              comment_id:        row.get(0)?,
              post_id:           row.get(1)?,
              author_id:         row.get(2)?,
              parent_comment_id: row.get(3)?,
              body:              row.get(4)?,
              created_at:        row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn delete_comment(&self, comment_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(comment_id);

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let post_str: Option<String> = tx
          .query_row(
            "SELECT post_id FROM comments WHERE comment_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(post_str) = post_str else {
          return Ok(false);
        };

        tx.execute(
          "DELETE FROM comments WHERE comment_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "UPDATE posts SET comment_count = MAX(comment_count - 1, 0)
           WHERE post_id = ?1",
          rusqlite::params![post_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(removed)
  }

  async fn delete_post_comments(&self, post_id: Uuid) -> Result<usize> {
    let post_str = encode_uuid(post_id);

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let removed = tx.execute(
          "DELETE FROM comments WHERE post_id = ?1",
          rusqlite::params![post_str],
        )?;
        tx.execute(
          "UPDATE posts SET comment_count = 0 WHERE post_id = ?1",
          rusqlite::params![post_str],
        )?;
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    Ok(removed)
  }

  // ── Audit & income ────────────────────────────────────────────────────────

  async fn append_audit(&self, input: NewAuditEntry) -> Result<AuditEntry> {
    let entry = AuditEntry {
      audit_id:     Uuid::new_v4(),
      action:       input.action,
      performed_by: input.performed_by,
      target_id:    input.target_id,
      changes:      input.changes,
      created_at:   Utc::now(),
    };

    let id_str      = encode_uuid(entry.audit_id);
    let action      = entry.action.clone();
    let by_str      = encode_uuid(entry.performed_by);
    let target_str  = entry.target_id.map(encode_uuid);
    let changes_str = serde_json::to_string(&entry.changes)?;
    let at_str      = encode_dt(entry.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audit_log (audit_id, action, performed_by, target_id,
             changes, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, action, by_str, target_str, changes_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(entry)
  }

  async fn audit_log(&self, limit: usize) -> Result<Vec<AuditEntry>> {
    let limit = limit as i64;

    let raws: Vec<RawAuditEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT audit_id, action, performed_by, target_id, changes, created_at
           FROM audit_log ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok(RawAuditEntry {
              audit_id:     row.get(0)?,
              action:       row.get(1)?,
              performed_by: row.get(2)?,
              target_id:    row.get(3)?,
              changes:      row.get(4)?,
              created_at:   row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditEntry::into_entry).collect()
  }

  async fn record_income(
    &self,
    input: NewIncomeTransaction,
    recorded_by: Uuid,
  ) -> Result<IncomeTransaction> {
    let tx = IncomeTransaction {
      tx_id:        Uuid::new_v4(),
      amount_cents: input.amount_cents,
      method:       input.method,
      purpose:      input.purpose,
      category:     input.category,
      description:  input.description,
      recorded_by,
      created_at:   Utc::now(),
    };

    let id_str      = encode_uuid(tx.tx_id);
    let amount      = tx.amount_cents;
    let method      = tx.method.clone();
    let purpose     = tx.purpose.clone();
    let category    = tx.category.clone();
    let description = tx.description.clone();
    let by_str      = encode_uuid(tx.recorded_by);
    let at_str      = encode_dt(tx.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO income_transactions (tx_id, amount_cents, method,
             purpose, category, description, recorded_by, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            amount,
            method,
            purpose,
            category,
            description,
            by_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(tx)
  }

  async fn income_transactions(&self) -> Result<Vec<IncomeTransaction>> {
    let raws: Vec<RawIncomeTransaction> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT tx_id, amount_cents, method, purpose, category, description,
             recorded_by, created_at
           FROM income_transactions ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawIncomeTransaction {
              tx_id:        row.get(0)?,
              amount_cents: row.get(1)?,
              method:       row.get(2)?,
              purpose:      row.get(3)?,
              category:     row.get(4)?,
              description:  row.get(5)?,
              recorded_by:  row.get(6)?,
              created_at:   row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIncomeTransaction::into_tx).collect()
  }
}
