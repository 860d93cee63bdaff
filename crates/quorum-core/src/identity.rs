//! The identity-provider contract and the principal/claims types.
//!
//! The provider owns credentials, opaque session tokens, and custom claims.
//! Quorum never stores passwords; it consumes this trait and nothing else.
//! `set_claims` and `delete_principal` are trust-boundary operations: only
//! the engine layer may call them, never an untrusted client.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

// ─── Principal & claims ──────────────────────────────────────────────────────

/// Provider-attested attributes attached to a session. Checked server-side
/// for trust decisions; the profile document's `role` field is never a
/// substitute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub admin: bool,
}

impl Claims {
  pub fn admin() -> Self { Claims { admin: true } }
}

/// An authenticated identity as issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub principal_id: Uuid,
  pub email:        String,
  pub claims:       Claims,
}

/// A successful sign-in: the principal plus the opaque session token the
/// client presents on subsequent calls.
#[derive(Debug, Clone)]
pub struct AuthSession {
  pub token:     String,
  pub principal: Principal,
}

// ─── Session subscription ────────────────────────────────────────────────────

/// One "current principal changed" notification.
///
/// `seq` increases monotonically per provider instance. Consumers resolving
/// state asynchronously must discard any resolution tagged with a `seq`
/// older than the newest event they have observed.
#[derive(Debug, Clone, Default)]
pub struct SessionEvent {
  pub seq:       u64,
  pub principal: Option<Principal>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the external identity provider.
///
/// Expected-domain outcomes (bad credentials, unknown token, duplicate
/// email) are expressed as `None`; `Self::Error` is reserved for
/// infrastructure failures, which callers treat by failing closed.
pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Subscribe to current-principal changes. Events arrive in order; the
  /// receiver coalesces to the latest value.
  fn subscribe(&self) -> watch::Receiver<SessionEvent>;

  /// Create a principal. Returns `None` if the email is already taken.
  fn sign_up<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Option<Principal>, Self::Error>> + Send + 'a;

  /// Verify credentials and open a session. `None` on bad credentials.
  fn sign_in<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Option<AuthSession>, Self::Error>> + Send + 'a;

  /// Terminate the session behind `token`. Idempotent.
  fn sign_out<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Queue a password-reset email. Succeeds silently for unknown addresses
  /// so the endpoint does not leak which emails exist.
  fn send_password_reset<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Resolve a bearer token to its principal. `None` if the token is
  /// unknown or revoked.
  fn authenticate<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Option<Principal>, Self::Error>> + Send + 'a;

  /// Read the current claims for a principal. `None` if the principal does
  /// not exist; callers must treat that as "no claims".
  fn claims(
    &self,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<Option<Claims>, Self::Error>> + Send + '_;

  /// Replace the custom claims on a principal. Trusted callers only.
  /// Returns `false` if the principal does not exist.
  fn set_claims(
    &self,
    principal_id: Uuid,
    claims: Claims,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Revoke every live session belonging to a principal, ending the
  /// observed session if it was theirs. Trusted callers only (suspension
  /// kill switch). Returns `false` if the principal does not exist.
  fn revoke_sessions(
    &self,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete a principal and revoke its sessions. Trusted callers only.
  /// Does not cascade into any profile or authored content. Returns
  /// `false` if the principal does not exist.
  fn delete_principal(
    &self,
    principal_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
