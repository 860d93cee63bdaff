//! [`LocalIdentity`] — the in-memory identity provider.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use quorum_core::identity::{
  AuthSession, Claims, IdentityProvider, Principal, SessionEvent,
};
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};
use tokio::sync::watch;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Internal state ──────────────────────────────────────────────────────────

struct Account {
  principal_id:  Uuid,
  email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  password_hash: String,
  claims:        Claims,
}

impl Account {
  fn principal(&self) -> Principal {
    Principal {
      principal_id: self.principal_id,
      email:        self.email.clone(),
      claims:       self.claims,
    }
  }
}

#[derive(Default)]
struct Inner {
  accounts: HashMap<Uuid, Account>,
  by_email: HashMap<String, Uuid>,
  /// SHA-256 hex digest of each live token → owning principal.
  tokens:   HashMap<String, Uuid>,
  /// Digest of the token backing the currently-observed session, if any.
  current:  Option<String>,
}

// ─── Provider ────────────────────────────────────────────────────────────────

struct Shared {
  inner:      Mutex<Inner>,
  session_tx: watch::Sender<SessionEvent>,
}

/// In-memory identity provider with a single observed session.
///
/// Models the client-SDK view of the managed provider: one "current
/// principal" that sign-in/sign-out flip, broadcast to subscribers in
/// order with a monotonically increasing sequence number. Cloning is
/// cheap; all clones observe the same session.
#[derive(Clone)]
pub struct LocalIdentity {
  shared: Arc<Shared>,
}

impl Default for LocalIdentity {
  fn default() -> Self { Self::new() }
}

impl LocalIdentity {
  pub fn new() -> Self {
    let (session_tx, _) = watch::channel(SessionEvent::default());
    LocalIdentity {
      shared: Arc::new(Shared {
        inner: Mutex::new(Inner::default()),
        session_tx,
      }),
    }
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Publish a session change with the next sequence number.
  fn publish(&self, principal: Option<Principal>) {
    self.shared.session_tx.send_modify(|ev| {
      ev.seq += 1;
      ev.principal = principal;
    });
  }

  fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(
      Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Hash(e.to_string()))?
        .to_string(),
    )
  }

  fn verify_password(password: &str, phc: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
      return false;
    };
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  }

  fn mint_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    B64.encode(bytes)
  }

  fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
  }
}

impl IdentityProvider for LocalIdentity {
  type Error = Error;

  fn subscribe(&self) -> watch::Receiver<SessionEvent> {
    self.shared.session_tx.subscribe()
  }

  async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Principal>> {
    let email = email.trim().to_ascii_lowercase();
    let password_hash = Self::hash_password(password)?;

    let mut inner = self.lock();
    if inner.by_email.contains_key(&email) {
      return Ok(None);
    }

    let account = Account {
      principal_id: Uuid::new_v4(),
      email: email.clone(),
      password_hash,
      claims: Claims::default(),
    };
    let principal = account.principal();
    inner.by_email.insert(email, account.principal_id);
    inner.accounts.insert(account.principal_id, account);
    Ok(Some(principal))
  }

  async fn sign_in(&self, email: &str, password: &str) -> Result<Option<AuthSession>> {
    let email = email.trim().to_ascii_lowercase();

    let mut inner = self.lock();
    let Some(&id) = inner.by_email.get(&email) else {
      return Ok(None);
    };
    let Some(account) = inner.accounts.get(&id) else {
      return Ok(None);
    };
    if !Self::verify_password(password, &account.password_hash) {
      return Ok(None);
    }

    let principal = account.principal();
    let token = Self::mint_token();
    let digest = Self::digest(&token);
    inner.tokens.insert(digest.clone(), id);
    inner.current = Some(digest);
    drop(inner);

    self.publish(Some(principal.clone()));
    Ok(Some(AuthSession { token, principal }))
  }

  async fn sign_out(&self, token: &str) -> Result<()> {
    let digest = Self::digest(token);

    let mut inner = self.lock();
    inner.tokens.remove(&digest);
    let was_current = inner.current.as_deref() == Some(digest.as_str());
    if was_current {
      inner.current = None;
    }
    drop(inner);

    if was_current {
      self.publish(None);
    }
    Ok(())
  }

  async fn send_password_reset(&self, email: &str) -> Result<()> {
    // No mail transport here; the managed provider owns delivery. Succeed
    // silently either way so the endpoint does not leak which emails exist.
    let known = self
      .lock()
      .by_email
      .contains_key(&email.trim().to_ascii_lowercase());
    tracing::info!(known, "password reset requested");
    Ok(())
  }

  async fn authenticate(&self, token: &str) -> Result<Option<Principal>> {
    let digest = Self::digest(token);
    let inner = self.lock();
    let principal = inner
      .tokens
      .get(&digest)
      .and_then(|id| inner.accounts.get(id))
      .map(Account::principal);
    Ok(principal)
  }

  async fn claims(&self, principal_id: Uuid) -> Result<Option<Claims>> {
    Ok(self.lock().accounts.get(&principal_id).map(|a| a.claims))
  }

  async fn set_claims(&self, principal_id: Uuid, claims: Claims) -> Result<bool> {
    let mut inner = self.lock();
    match inner.accounts.get_mut(&principal_id) {
      Some(account) => {
        account.claims = claims;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn revoke_sessions(&self, principal_id: Uuid) -> Result<bool> {
    let mut inner = self.lock();
    if !inner.accounts.contains_key(&principal_id) {
      return Ok(false);
    }
    inner.tokens.retain(|_, id| *id != principal_id);

    let current_gone = inner
      .current
      .as_ref()
      .is_some_and(|digest| !inner.tokens.contains_key(digest));
    if current_gone {
      inner.current = None;
    }
    drop(inner);

    if current_gone {
      self.publish(None);
    }
    Ok(true)
  }

  async fn delete_principal(&self, principal_id: Uuid) -> Result<bool> {
    let mut inner = self.lock();
    let Some(account) = inner.accounts.remove(&principal_id) else {
      return Ok(false);
    };
    inner.by_email.remove(&account.email);
    inner.tokens.retain(|_, id| *id != principal_id);

    // If the deleted principal held the observed session, end it.
    let current_gone = inner
      .current
      .as_ref()
      .is_some_and(|digest| !inner.tokens.contains_key(digest));
    if current_gone {
      inner.current = None;
    }
    drop(inner);

    if current_gone {
      self.publish(None);
    }
    Ok(true)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
