//! Privileged admin operations.
//!
//! Every mutating operation re-verifies the caller's `admin` claim against
//! the identity provider (the profile `role` gates the UI only) and appends
//! exactly one audit entry alongside its primary effect.

use quorum_core::{
  Error, Principal, Result,
  audit::{AuditEntry, IncomeTransaction, NewIncomeTransaction},
  event::{Event, NewEvent},
  identity::IdentityProvider,
  profile::{MembershipStatus, Profile},
  store::CommunityStore,
};
use uuid::Uuid;

use crate::{
  claims::{record_audit, require_admin_claim},
  events::Reservations,
};

pub struct AdminOps<I, S> {
  identity:     I,
  store:        S,
  reservations: Reservations<S>,
}

impl<I, S> AdminOps<I, S>
where
  I: IdentityProvider,
  S: CommunityStore + Clone,
{
  pub fn new(identity: I, store: S) -> Self {
    AdminOps {
      identity,
      reservations: Reservations::new(store.clone()),
      store,
    }
  }

  /// Approve or reject a membership request.
  pub async fn set_status(
    &self,
    caller: &Principal,
    target: Uuid,
    status: MembershipStatus,
  ) -> Result<()> {
    require_admin_claim(&self.identity, caller).await?;

    if !self
      .store
      .set_status(target, status)
      .await
      .map_err(Error::unavailable)?
    {
      return Err(Error::NotFound(format!("profile {target}")));
    }

    record_audit(
      &self.store,
      "set_status",
      caller.principal_id,
      Some(target),
      serde_json::json!({ "status": status }),
    )
    .await
  }

  /// Flip the suspension kill switch.
  ///
  /// Setting the flag does not end a live session by itself; the access
  /// controller does that when it next observes the principal. Lifting it
  /// also discards any unread suspension notice.
  pub async fn set_suspended(
    &self,
    caller: &Principal,
    target: Uuid,
    suspended: bool,
  ) -> Result<()> {
    require_admin_claim(&self.identity, caller).await?;

    if !self
      .store
      .set_suspended(target, suspended)
      .await
      .map_err(Error::unavailable)?
    {
      return Err(Error::NotFound(format!("profile {target}")));
    }

    if !suspended {
      if let Err(error) = self.store.clear_suspension_notice(target).await {
        tracing::warn!(%error, principal_id = %target, "failed to clear suspension notice");
      }
    }

    record_audit(
      &self.store,
      "set_suspended",
      caller.principal_id,
      Some(target),
      serde_json::json!({ "suspended": suspended }),
    )
    .await
  }

  /// Create an event. Event semantics live in [`Reservations`]; this wraps
  /// them in the claim check and audit entry every admin mutation carries.
  pub async fn create_event(
    &self,
    caller: &Principal,
    input: NewEvent,
  ) -> Result<Event> {
    require_admin_claim(&self.identity, caller).await?;

    let event = self.reservations.create_event(input).await?;
    record_audit(
      &self.store,
      "create_event",
      caller.principal_id,
      Some(event.event_id),
      serde_json::json!({
        "title": event.title.clone(),
        "max_participants": event.max_participants,
      }),
    )
    .await?;
    Ok(event)
  }

  /// Delete an event, cascading its RSVPs.
  pub async fn delete_event(
    &self,
    caller: &Principal,
    event_id: Uuid,
  ) -> Result<()> {
    require_admin_claim(&self.identity, caller).await?;

    self.reservations.delete_event(event_id).await?;
    record_audit(
      &self.store,
      "delete_event",
      caller.principal_id,
      Some(event_id),
      serde_json::Value::Null,
    )
    .await
  }

  /// Record a self-reported income transaction.
  pub async fn record_income(
    &self,
    caller: &Principal,
    input: NewIncomeTransaction,
  ) -> Result<IncomeTransaction> {
    require_admin_claim(&self.identity, caller).await?;

    if input.amount_cents <= 0 {
      return Err(Error::InvalidArgument("amount_cents must be positive".into()));
    }
    for (field, value) in [
      ("method", &input.method),
      ("purpose", &input.purpose),
      ("category", &input.category),
    ] {
      if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{field} must not be empty")));
      }
    }

    let tx = self
      .store
      .record_income(input, caller.principal_id)
      .await
      .map_err(Error::unavailable)?;

    record_audit(
      &self.store,
      "record_income",
      caller.principal_id,
      None,
      serde_json::json!({ "tx_id": tx.tx_id, "amount_cents": tx.amount_cents }),
    )
    .await?;
    Ok(tx)
  }

  /// Membership roster, optionally filtered by status.
  pub async fn list_members(
    &self,
    caller: &Principal,
    status: Option<MembershipStatus>,
  ) -> Result<Vec<Profile>> {
    require_admin_claim(&self.identity, caller).await?;
    self
      .store
      .list_profiles(status)
      .await
      .map_err(Error::unavailable)
  }

  pub async fn audit_log(
    &self,
    caller: &Principal,
    limit: usize,
  ) -> Result<Vec<AuditEntry>> {
    require_admin_claim(&self.identity, caller).await?;
    self.store.audit_log(limit).await.map_err(Error::unavailable)
  }

  pub async fn income_transactions(
    &self,
    caller: &Principal,
  ) -> Result<Vec<IncomeTransaction>> {
    require_admin_claim(&self.identity, caller).await?;
    self
      .store
      .income_transactions()
      .await
      .map_err(Error::unavailable)
  }
}
