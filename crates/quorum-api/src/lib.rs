//! JSON REST API for Quorum.
//!
//! Exposes an axum [`Router`] backed by any identity provider and community
//! store pair. Route guards resolve the caller per request; the long-lived
//! session state machine lives in `quorum_engine::AccessController` and is
//! driven by the server binary.

pub mod admin;
pub mod auth;
pub mod error;
pub mod events;
pub mod extract;
pub mod posts;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post},
};
use quorum_core::{identity::IdentityProvider, store::CommunityStore};
use quorum_engine::{AdminOps, ClaimSync, Feed, Reservations};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,

  /// When both are set, an approved admin account (profile role, identity
  /// claim, and credentials) is seeded at startup if the email is free.
  pub seed_admin_email:    Option<String>,
  pub seed_admin_password: Option<String>,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<I, S> {
  pub identity:     I,
  pub store:        S,
  pub reservations: Arc<Reservations<S>>,
  pub feed:         Arc<Feed<S>>,
  pub admin:        Arc<AdminOps<I, S>>,
  pub claims:       Arc<ClaimSync<I, S>>,
}

impl<I, S> Clone for AppState<I, S>
where
  I: Clone,
  S: Clone,
{
  fn clone(&self) -> Self {
    AppState {
      identity:     self.identity.clone(),
      store:        self.store.clone(),
      reservations: Arc::clone(&self.reservations),
      feed:         Arc::clone(&self.feed),
      admin:        Arc::clone(&self.admin),
      claims:       Arc::clone(&self.claims),
    }
  }
}

impl<I, S> AppState<I, S>
where
  I: IdentityProvider + Clone,
  S: CommunityStore + Clone,
{
  pub fn new(identity: I, store: S) -> Self {
    AppState {
      reservations: Arc::new(Reservations::new(store.clone())),
      feed:         Arc::new(Feed::new(store.clone())),
      admin:        Arc::new(AdminOps::new(identity.clone(), store.clone())),
      claims:       Arc::new(ClaimSync::new(identity.clone(), store.clone())),
      identity,
      store,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised router for the state.
pub fn router<I, S>(state: AppState<I, S>) -> Router
where
  I: IdentityProvider + Clone + 'static,
  S: CommunityStore + Clone + 'static,
{
  Router::new()
    // Auth & session
    .route("/auth/register", post(auth::register::<I, S>))
    .route("/auth/login",    post(auth::login::<I, S>))
    .route("/auth/logout",   post(auth::logout::<I, S>))
    .route("/auth/reset",    post(auth::reset::<I, S>))
    .route("/me",            get(auth::me::<I, S>))
    .route("/me/profile",    post(auth::update_profile::<I, S>))
    // Events
    .route("/events",            get(events::list::<I, S>))
    .route("/events/mine",       get(events::mine::<I, S>))
    .route("/events/{id}/rsvp",
      post(events::register::<I, S>).delete(events::unregister::<I, S>))
    // Feed
    .route("/posts", get(posts::list::<I, S>).post(posts::create::<I, S>))
    .route("/posts/{id}",          delete(posts::delete_post::<I, S>))
    .route("/posts/{id}/like",     post(posts::like::<I, S>))
    .route("/posts/{id}/comments",
      get(posts::comments::<I, S>).post(posts::comment::<I, S>))
    .route("/comments/{id}", delete(posts::delete_comment::<I, S>))
    // Admin
    .route("/admin/bootstrap",          post(admin::bootstrap::<I, S>))
    .route("/admin/members",            get(admin::members::<I, S>))
    .route("/admin/users/{id}/role",    post(admin::set_role::<I, S>))
    .route("/admin/users/{id}/status",  post(admin::set_status::<I, S>))
    .route("/admin/users/{id}/suspend", post(admin::set_suspended::<I, S>))
    .route("/admin/users/{id}",         delete(admin::delete_user::<I, S>))
    .route("/admin/events",             post(admin::create_event::<I, S>))
    .route("/admin/events/{id}",        delete(admin::delete_event::<I, S>))
    .route("/admin/income",
      get(admin::income::<I, S>).post(admin::record_income::<I, S>))
    .route("/admin/audit", get(admin::audit::<I, S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
