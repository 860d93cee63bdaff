//! The claim-synchronization protocol.
//!
//! The profile's `role` field and the identity provider's `admin` claim are
//! two copies of one fact. [`ClaimSync`] owns every write that touches the
//! claim, so the two can only drift through a failure it has already
//! surfaced and logged.

use std::time::Duration;

use quorum_core::{
  Error, Principal, Result,
  identity::{Claims, IdentityProvider},
  profile::Role,
  store::CommunityStore,
};
use uuid::Uuid;

/// Attempts for the claim-alignment write in [`ClaimSync::set_role`].
const CLAIM_WRITE_ATTEMPTS: u32 = 3;
const CLAIM_WRITE_BACKOFF: Duration = Duration::from_millis(50);

/// Verify the caller's `admin` claim against the identity provider. The
/// claims carried on the passed-in principal are never trusted.
pub(crate) async fn require_admin_claim<I: IdentityProvider>(
  identity: &I,
  caller: &Principal,
) -> Result<()> {
  let claims = identity
    .claims(caller.principal_id)
    .await
    .map_err(Error::unavailable)?;
  match claims {
    Some(c) if c.admin => Ok(()),
    _ => Err(Error::PermissionDenied("admin claim required".into())),
  }
}

/// Append one audit entry for a privileged operation.
pub(crate) async fn record_audit<S: CommunityStore>(
  store: &S,
  action: &str,
  performed_by: Uuid,
  target_id: Option<Uuid>,
  changes: serde_json::Value,
) -> Result<()> {
  store
    .append_audit(quorum_core::audit::NewAuditEntry {
      action: action.into(),
      performed_by,
      target_id,
      changes,
    })
    .await
    .map_err(Error::unavailable)?;
  Ok(())
}

/// The three trust-boundary entry points that may touch identity claims.
pub struct ClaimSync<I, S> {
  identity: I,
  store:    S,
}

impl<I, S> ClaimSync<I, S>
where
  I: IdentityProvider,
  S: CommunityStore,
{
  pub fn new(identity: I, store: S) -> Self {
    ClaimSync { identity, store }
  }

  /// First-admin escalation: grant the caller the `admin` claim iff their
  /// profile already carries `role = admin`.
  ///
  /// Never writes `profile.role`. A failed precondition leaves no partial
  /// effect.
  pub async fn bootstrap(&self, caller: &Principal) -> Result<()> {
    let id = caller.principal_id;
    let profile = self
      .store
      .profile(id)
      .await
      .map_err(Error::unavailable)?;
    let is_admin = profile.is_some_and(|p| p.role == Role::Admin);
    if !is_admin {
      return Err(Error::PermissionDenied(
        "bootstrap requires an admin profile role".into(),
      ));
    }

    if !self
      .identity
      .set_claims(id, Claims::admin())
      .await
      .map_err(Error::unavailable)?
    {
      return Err(Error::unavailable(format!(
        "identity provider has no principal {id}"
      )));
    }

    tracing::info!(principal_id = %id, "bootstrap granted admin claim");
    record_audit(
      &self.store,
      "bootstrap_admin",
      id,
      Some(id),
      serde_json::json!({ "claims": { "admin": true } }),
    )
    .await
  }

  /// Change a member's role, keeping the profile field and the identity
  /// claim aligned. Idempotent.
  ///
  /// The profile is written first; the claim write is then retried a few
  /// times. If it still fails, the disagreement is surfaced as
  /// `Unavailable` rather than masked.
  pub async fn set_role(
    &self,
    caller: &Principal,
    target: Uuid,
    role: Role,
  ) -> Result<()> {
    require_admin_claim(&self.identity, caller).await?;

    if !self
      .store
      .set_role(target, role)
      .await
      .map_err(Error::unavailable)?
    {
      return Err(Error::NotFound(format!("profile {target}")));
    }

    let desired = Claims { admin: role == Role::Admin };
    self.align_claim(target, desired).await?;

    record_audit(
      &self.store,
      "set_role",
      caller.principal_id,
      Some(target),
      serde_json::json!({ "role": role }),
    )
    .await
  }

  /// Remove a member's account from the identity provider.
  ///
  /// The profile document and authored content are deliberately left
  /// behind; only the ability to sign in is destroyed.
  pub async fn delete_principal(
    &self,
    caller: &Principal,
    target: Uuid,
  ) -> Result<()> {
    require_admin_claim(&self.identity, caller).await?;

    if !self
      .identity
      .delete_principal(target)
      .await
      .map_err(Error::unavailable)?
    {
      return Err(Error::NotFound(format!("principal {target}")));
    }

    tracing::info!(principal_id = %target, "principal deleted");
    record_audit(
      &self.store,
      "delete_principal",
      caller.principal_id,
      Some(target),
      serde_json::Value::Null,
    )
    .await
  }

  async fn align_claim(&self, target: Uuid, desired: Claims) -> Result<()> {
    let mut last_error = None;
    for attempt in 1..=CLAIM_WRITE_ATTEMPTS {
      match self.identity.set_claims(target, desired).await {
        Ok(true) => return Ok(()),
        Ok(false) => {
          // The profile exists but the identity record is gone; retrying
          // will not bring it back.
          return Err(Error::unavailable(format!(
            "profile updated but identity provider has no principal {target}"
          )));
        }
        Err(error) => {
          tracing::warn!(%error, attempt, "claim write failed");
          last_error = Some(error);
          if attempt < CLAIM_WRITE_ATTEMPTS {
            tokio::time::sleep(CLAIM_WRITE_BACKOFF * attempt).await;
          }
        }
      }
    }
    // Profile and claim now disagree; the caller must see that.
    Err(Error::Unavailable(format!(
      "role updated but claim write failed for {target}: {}",
      last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
  }
}
