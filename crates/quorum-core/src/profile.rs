//! Profile — the durable per-principal membership document.
//!
//! One document per principal, keyed by principal id. `role` is the UI-tier
//! copy of the admin fact; the identity claim is the authoritative copy for
//! privileged checks. The two are synchronized, not transactional.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// UI-tier role stored on the profile document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  Member,
  Admin,
}

impl Role {
  /// Parse the wire form used by the privileged role endpoint.
  pub fn parse(s: &str) -> Option<Role> {
    match s {
      "member" => Some(Role::Member),
      "admin"  => Some(Role::Admin),
      _        => None,
    }
  }
}

/// Where a registration sits in the admin approval queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

/// Denormalized per-member counters, maintained best-effort alongside the
/// source collections. Never authoritative for capacity decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStats {
  pub posts:       u32,
  pub likes:       u32,
  pub events:      u32,
  pub connections: u32,
}

/// Which stat counter to adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
  Posts,
  Likes,
  Events,
  Connections,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
  pub principal_id:  Uuid,
  pub role:          Role,
  pub status:        MembershipStatus,
  pub suspended:     bool,
  pub name:          String,
  pub email:         String,
  pub phone:         Option<String>,
  pub bio:           Option<String>,
  pub stats:         ProfileStats,
  pub requested_at:  DateTime<Utc>,
  pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for profile creation at registration time. `status` starts at
/// `Pending` and `role` at `Member`; the store assigns `requested_at`.
#[derive(Debug, Clone)]
pub struct NewProfile {
  pub principal_id: Uuid,
  pub name:         String,
  pub email:        String,
  pub phone:        Option<String>,
  pub bio:          Option<String>,
}

/// Subject-editable contact fields, merged into the document. `None` fields
/// are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
  pub name:  Option<String>,
  pub phone: Option<String>,
  pub bio:   Option<String>,
}
