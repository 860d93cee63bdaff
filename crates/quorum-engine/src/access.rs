//! The access-control engine.
//!
//! [`AccessController`] is an explicitly constructed context object, never a
//! global. It consumes the identity provider's session subscription, resolves
//! each change to an [`AccessContext`] with exactly one profile read, and
//! publishes the result over a `watch` channel. [`authorize`] performs the
//! same resolution once for a single request.

use quorum_core::{
  Error, Principal, Result,
  identity::{IdentityProvider, SessionEvent},
  profile::{MembershipStatus, Profile, Role},
  store::CommunityStore,
};
use tokio::sync::watch;

/// Message persisted for next-visit display when the kill switch fires.
/// Also the fallback shown at login when the suspended profile is observed
/// before the controller has written the stored notice.
pub const SUSPENSION_NOTICE: &str =
  "Your account has been suspended. Contact an administrator for details.";

// ─── Access state ────────────────────────────────────────────────────────────

/// Where a session sits in the access model.
///
/// `Unresolved` exists only before the first resolution completes; guards
/// never authorize it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessState {
  #[default]
  Unresolved,
  /// No usable principal: signed out, suspended, or failed closed.
  Guest,
  /// Signed in, but membership is awaiting (or missing) approval.
  Pending,
  Rejected,
  Approved,
  /// Approved with `role = admin` on the profile. UI-tier gating only;
  /// privileged engine calls re-verify the identity claim.
  Admin,
}

/// A resolved view of the current session, published by the controller and
/// consumed by route guards.
#[derive(Debug, Clone, Default)]
pub struct AccessContext {
  /// Sequence number of the session event this context was resolved from.
  pub seq:       u64,
  pub state:     AccessState,
  pub principal: Option<Principal>,
  pub profile:   Option<Profile>,
}

impl AccessContext {
  fn resolve(seq: u64, principal: Principal, profile: Option<Profile>) -> Self {
    let state = match &profile {
      // A principal without a profile document is never authorized.
      None => AccessState::Pending,
      Some(p) if p.suspended => AccessState::Guest,
      Some(p) => match (p.status, p.role) {
        (MembershipStatus::Pending, _)            => AccessState::Pending,
        (MembershipStatus::Rejected, _)           => AccessState::Rejected,
        (MembershipStatus::Approved, Role::Admin) => AccessState::Admin,
        (MembershipStatus::Approved, _)           => AccessState::Approved,
      },
    };
    AccessContext { seq, state, principal: Some(principal), profile }
  }

  fn guest(seq: u64) -> Self {
    AccessContext { seq, state: AccessState::Guest, principal: None, profile: None }
  }

  /// The caller, or `Unauthenticated` if the session is signed out.
  pub fn principal(&self) -> Result<&Principal> {
    self.principal.as_ref().ok_or(Error::Unauthenticated)
  }

  /// Guard for member-gated features: approved and not suspended.
  pub fn require_approved(&self) -> Result<&Profile> {
    let _ = self.principal()?;
    match self.state {
      AccessState::Approved | AccessState::Admin => {
        self
          .profile
          .as_ref()
          .ok_or_else(|| Error::PermissionDenied("membership not active".into()))
      }
      _ => Err(Error::PermissionDenied("membership not active".into())),
    }
  }

  /// Guard for admin-facing routes. Reads the profile's `role` field, so it
  /// gates the surface only; trust decisions re-verify the identity claim.
  pub fn require_admin(&self) -> Result<&Profile> {
    let _ = self.principal()?;
    match self.state {
      AccessState::Admin => {
        self
          .profile
          .as_ref()
          .ok_or_else(|| Error::PermissionDenied("admin role required".into()))
      }
      _ => Err(Error::PermissionDenied("admin role required".into())),
    }
  }
}

// ─── Per-request resolution ──────────────────────────────────────────────────

/// Resolve one request's access context from an already-authenticated
/// principal.
///
/// Same state mapping as the controller, minus the side effects: a suspended
/// profile resolves to `Guest` and is denied, but session termination stays
/// with the controller.
pub async fn authorize<S: CommunityStore>(
  store: &S,
  principal: Option<Principal>,
) -> Result<AccessContext> {
  let Some(principal) = principal else {
    return Ok(AccessContext::guest(0));
  };
  let profile = store
    .profile(principal.principal_id)
    .await
    .map_err(Error::unavailable)?;
  Ok(AccessContext::resolve(0, principal, profile))
}

// ─── Controller ──────────────────────────────────────────────────────────────

/// Drives session changes into published [`AccessContext`] snapshots and
/// owns the suspension kill switch.
pub struct AccessController<I, S> {
  identity: I,
  store:    S,
  ctx_tx:   watch::Sender<AccessContext>,
}

impl<I, S> AccessController<I, S>
where
  I: IdentityProvider,
  S: CommunityStore,
{
  pub fn new(identity: I, store: S) -> Self {
    let (ctx_tx, _) = watch::channel(AccessContext::default());
    AccessController { identity, store, ctx_tx }
  }

  /// Subscribe to resolved context snapshots. Call before [`run`] so the
  /// loop does not observe an already-closed channel.
  ///
  /// [`run`]: AccessController::run
  pub fn subscribe(&self) -> watch::Receiver<AccessContext> {
    self.ctx_tx.subscribe()
  }

  /// Drive the resolution loop until the identity subscription closes or
  /// every context receiver drops. Nothing is written after return.
  pub async fn run(self) {
    let mut session_rx = self.identity.subscribe();

    loop {
      let event = session_rx.borrow_and_update().clone();
      let ctx = self.resolve_event(event).await;

      // A newer session event may have arrived while the profile read was
      // in flight; that resolution is stale and must not be published.
      let stale = session_rx.has_changed().unwrap_or(false);
      if stale {
        tracing::debug!(seq = ctx.seq, "discarding stale access resolution");
        continue;
      }
      self.ctx_tx.send_replace(ctx);

      tokio::select! {
        changed = session_rx.changed() => {
          if changed.is_err() {
            tracing::debug!("session subscription closed; stopping");
            break;
          }
        }
        () = self.ctx_tx.closed() => {
          tracing::debug!("all context receivers dropped; stopping");
          break;
        }
      }
    }
  }

  /// One session event, one profile read.
  async fn resolve_event(&self, event: SessionEvent) -> AccessContext {
    let SessionEvent { seq, principal } = event;
    let Some(principal) = principal else {
      return AccessContext::guest(seq);
    };

    let profile = match self.store.profile(principal.principal_id).await {
      Ok(profile) => profile,
      Err(error) => {
        // Fail closed: an unreadable profile must never grant access.
        tracing::warn!(%error, "profile read failed; resolving to guest");
        return AccessContext::guest(seq);
      }
    };

    if profile.as_ref().is_some_and(|p| p.suspended) {
      self.enforce_suspension(&principal).await;
      return AccessContext::guest(seq);
    }

    AccessContext::resolve(seq, principal, profile)
  }

  /// The kill switch: persist the notice, then terminate the external
  /// session. Both are attempted even if the first fails.
  async fn enforce_suspension(&self, principal: &Principal) {
    let id = principal.principal_id;
    tracing::info!(principal_id = %id, "suspended principal signed in; revoking session");

    if let Err(error) = self.store.put_suspension_notice(id, SUSPENSION_NOTICE).await
    {
      tracing::warn!(%error, "failed to persist suspension notice");
    }
    if let Err(error) = self.identity.revoke_sessions(id).await {
      tracing::warn!(%error, "failed to revoke suspended principal's sessions");
    }
  }
}
