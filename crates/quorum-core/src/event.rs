//! Event and RSVP types for the capacity-reservation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
  #[default]
  Upcoming,
  Cancelled,
  Completed,
}

/// A capacity-limited event.
///
/// `registration_count` is denormalized from the RSVP rows and maintained
/// in the same store transaction as every RSVP write, so it never exceeds
/// `max_participants` when that is non-zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
  pub event_id:           Uuid,
  pub title:              String,
  pub starts_at:          DateTime<Utc>,
  pub location:           String,
  pub description:        String,
  /// 0 means unlimited.
  pub max_participants:   u32,
  pub registration_count: u32,
  pub status:             EventStatus,
  pub created_by:         Uuid,
  pub created_at:         DateTime<Utc>,
}

impl Event {
  /// Whether another registration would exceed capacity.
  pub fn at_capacity(&self) -> bool {
    self.max_participants > 0 && self.registration_count >= self.max_participants
  }
}

#[derive(Debug, Clone)]
pub struct NewEvent {
  pub title:            String,
  pub starts_at:        DateTime<Utc>,
  pub location:         String,
  pub description:      String,
  pub max_participants: u32,
  pub created_by:       Uuid,
}

/// The attendee's declared intent. Row existence, not this value, is what
/// counts toward capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
  #[default]
  Going,
  Interested,
}

/// One registration row per `(event, principal)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rsvp {
  pub event_id:     Uuid,
  pub principal_id: Uuid,
  pub status:       RsvpStatus,
  pub updated_at:   DateTime<Utc>,
}
