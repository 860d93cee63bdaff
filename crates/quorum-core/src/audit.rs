//! Audit log and income-transaction records.
//!
//! Audit entries are append-only: the store never updates or deletes one.
//! Every privileged operation writes exactly one entry alongside its
//! primary effect, with the same timestamp source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
  pub audit_id:     Uuid,
  /// Machine-readable action name, e.g. `"set_role"` or `"bootstrap_admin"`.
  pub action:       String,
  pub performed_by: Uuid,
  pub target_id:    Option<Uuid>,
  /// Free-form description of what changed, e.g. `{"role": "admin"}`.
  pub changes:      serde_json::Value,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
  pub action:       String,
  pub performed_by: Uuid,
  pub target_id:    Option<Uuid>,
  pub changes:      serde_json::Value,
}

/// A self-reported income transaction recorded by an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeTransaction {
  pub tx_id:        Uuid,
  /// Always positive; validated before the write.
  pub amount_cents: i64,
  pub method:       String,
  pub purpose:      String,
  pub category:     String,
  pub description:  Option<String>,
  pub recorded_by:  Uuid,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIncomeTransaction {
  pub amount_cents: i64,
  pub method:       String,
  pub purpose:      String,
  pub category:     String,
  pub description:  Option<String>,
}
