//! Column encoding/decoding between domain types and SQLite text columns.

use chrono::{DateTime, Utc};
use quorum_core::{
  audit::{AuditEntry, IncomeTransaction},
  event::{Event, EventStatus, Rsvp, RsvpStatus},
  feed::{Comment, Post},
  profile::{MembershipStatus, Profile, ProfileStats, Role, StatField},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String {
  id.to_string()
}

pub fn parse_uuid(s: &str) -> Result<Uuid> {
  Ok(Uuid::parse_str(s)?)
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn parse_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn parse_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(parse_dt).transpose()
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str {
  match role {
    Role::Member => "member",
    Role::Admin  => "admin",
  }
}

pub fn parse_role(s: &str) -> Result<Role> {
  Role::parse(s).ok_or_else(|| Error::UnknownEnum {
    column: "role",
    value:  s.to_owned(),
  })
}

pub fn encode_status(status: MembershipStatus) -> &'static str {
  match status {
    MembershipStatus::Pending  => "pending",
    MembershipStatus::Approved => "approved",
    MembershipStatus::Rejected => "rejected",
  }
}

pub fn parse_status(s: &str) -> Result<MembershipStatus> {
  match s {
    "pending"  => Ok(MembershipStatus::Pending),
    "approved" => Ok(MembershipStatus::Approved),
    "rejected" => Ok(MembershipStatus::Rejected),
    _ => Err(Error::UnknownEnum { column: "status", value: s.to_owned() }),
  }
}

pub fn encode_event_status(status: EventStatus) -> &'static str {
  match status {
    EventStatus::Upcoming  => "upcoming",
    EventStatus::Cancelled => "cancelled",
    EventStatus::Completed => "completed",
  }
}

pub fn parse_event_status(s: &str) -> Result<EventStatus> {
  match s {
    "upcoming"  => Ok(EventStatus::Upcoming),
    "cancelled" => Ok(EventStatus::Cancelled),
    "completed" => Ok(EventStatus::Completed),
    _ => Err(Error::UnknownEnum { column: "event status", value: s.to_owned() }),
  }
}

pub fn encode_rsvp_status(status: RsvpStatus) -> &'static str {
  match status {
    RsvpStatus::Going      => "going",
    RsvpStatus::Interested => "interested",
  }
}

pub fn parse_rsvp_status(s: &str) -> Result<RsvpStatus> {
  match s {
    "going"      => Ok(RsvpStatus::Going),
    "interested" => Ok(RsvpStatus::Interested),
    _ => Err(Error::UnknownEnum { column: "rsvp status", value: s.to_owned() }),
  }
}

/// Column backing each denormalized stat counter. Static names only; these
/// are interpolated into SQL.
pub fn stat_column(field: StatField) -> &'static str {
  match field {
    StatField::Posts       => "posts",
    StatField::Likes       => "likes",
    StatField::Events      => "events",
    StatField::Connections => "connections",
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

pub struct RawProfile {
  pub principal_id:  String,
  pub role:          String,
  pub status:        String,
  pub suspended:     bool,
  pub name:          String,
  pub email:         String,
  pub phone:         Option<String>,
  pub bio:           Option<String>,
  pub posts:         i64,
  pub likes:         i64,
  pub events:        i64,
  pub connections:   i64,
  pub requested_at:  String,
  pub last_login_at: Option<String>,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      principal_id:  parse_uuid(&self.principal_id)?,
      role:          parse_role(&self.role)?,
      status:        parse_status(&self.status)?,
      suspended:     self.suspended,
      name:          self.name,
      email:         self.email,
      phone:         self.phone,
      bio:           self.bio,
      stats:         ProfileStats {
        posts:       self.posts.max(0) as u32,
        likes:       self.likes.max(0) as u32,
        events:      self.events.max(0) as u32,
        connections: self.connections.max(0) as u32,
      },
      requested_at:  parse_dt(&self.requested_at)?,
      last_login_at: parse_opt_dt(self.last_login_at.as_deref())?,
    })
  }
}

pub struct RawEvent {
  pub event_id:           String,
  pub title:              String,
  pub starts_at:          String,
  pub location:           String,
  pub description:        String,
  pub max_participants:   i64,
  pub registration_count: i64,
  pub status:             String,
  pub created_by:         String,
  pub created_at:         String,
}

impl RawEvent {
  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:           parse_uuid(&self.event_id)?,
      title:              self.title,
      starts_at:          parse_dt(&self.starts_at)?,
      location:           self.location,
      description:        self.description,
      max_participants:   self.max_participants.max(0) as u32,
      registration_count: self.registration_count.max(0) as u32,
      status:             parse_event_status(&self.status)?,
      created_by:         parse_uuid(&self.created_by)?,
      created_at:         parse_dt(&self.created_at)?,
    })
  }
}

pub struct RawRsvp {
  pub event_id:     String,
  pub principal_id: String,
  pub status:       String,
  pub updated_at:   String,
}

impl RawRsvp {
  pub fn into_rsvp(self) -> Result<Rsvp> {
    Ok(Rsvp {
      event_id:     parse_uuid(&self.event_id)?,
      principal_id: parse_uuid(&self.principal_id)?,
      status:       parse_rsvp_status(&self.status)?,
      updated_at:   parse_dt(&self.updated_at)?,
    })
  }
}

pub struct RawPost {
  pub post_id:       String,
  pub author_id:     String,
  pub body:          String,
  pub likes_count:   i64,
  pub comment_count: i64,
  pub created_at:    String,
}

impl RawPost {
  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      post_id:       parse_uuid(&self.post_id)?,
      author_id:     parse_uuid(&self.author_id)?,
      body:          self.body,
      likes_count:   self.likes_count.max(0) as u32,
      comment_count: self.comment_count.max(0) as u32,
      created_at:    parse_dt(&self.created_at)?,
    })
  }
}

pub struct RawComment {
  pub comment_id:        String,
  pub post_id:           String,
  pub author_id:         String,
  pub parent_comment_id: Option<String>,
  pub body:              String,
  pub created_at:        String,
}

impl RawComment {
  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id:        parse_uuid(&self.comment_id)?,
      post_id:           parse_uuid(&self.post_id)?,
      author_id:         parse_uuid(&self.author_id)?,
      parent_comment_id: self
        .parent_comment_id
        .as_deref()
        .map(parse_uuid)
        .transpose()?,
      body:              self.body,
      created_at:        parse_dt(&self.created_at)?,
    })
  }
}

pub struct RawAuditEntry {
  pub audit_id:     String,
  pub action:       String,
  pub performed_by: String,
  pub target_id:    Option<String>,
  pub changes:      String,
  pub created_at:   String,
}

impl RawAuditEntry {
  pub fn into_entry(self) -> Result<AuditEntry> {
    Ok(AuditEntry {
      audit_id:     parse_uuid(&self.audit_id)?,
      action:       self.action,
      performed_by: parse_uuid(&self.performed_by)?,
      target_id:    self.target_id.as_deref().map(parse_uuid).transpose()?,
      changes:      serde_json::from_str(&self.changes)?,
      created_at:   parse_dt(&self.created_at)?,
    })
  }
}

pub struct RawIncomeTransaction {
  pub tx_id:        String,
  pub amount_cents: i64,
  pub method:       String,
  pub purpose:      String,
  pub category:     String,
  pub description:  Option<String>,
  pub recorded_by:  String,
  pub created_at:   String,
}

impl RawIncomeTransaction {
  pub fn into_tx(self) -> Result<IncomeTransaction> {
    Ok(IncomeTransaction {
      tx_id:        parse_uuid(&self.tx_id)?,
      amount_cents: self.amount_cents,
      method:       self.method,
      purpose:      self.purpose,
      category:     self.category,
      description:  self.description,
      recorded_by:  parse_uuid(&self.recorded_by)?,
      created_at:   parse_dt(&self.created_at)?,
    })
  }
}
