//! The capacity-reservation engine for events.

use quorum_core::{
  Error, Result,
  event::{Event, NewEvent, Rsvp, RsvpStatus},
  profile::StatField,
  store::{CommunityStore, ReserveOutcome},
};
use uuid::Uuid;

/// Event registration on top of the store's transactional reserve.
///
/// Authorization happens at the caller; these operations assume the
/// principal has already been admitted by an access guard.
pub struct Reservations<S> {
  store: S,
}

impl<S: CommunityStore> Reservations<S> {
  pub fn new(store: S) -> Self {
    Reservations { store }
  }

  pub async fn list_events(&self) -> Result<Vec<Event>> {
    self.store.list_events().await.map_err(Error::unavailable)
  }

  pub async fn event(&self, event_id: Uuid) -> Result<Event> {
    self
      .store
      .event(event_id)
      .await
      .map_err(Error::unavailable)?
      .ok_or_else(|| Error::NotFound(format!("event {event_id}")))
  }

  pub async fn create_event(&self, input: NewEvent) -> Result<Event> {
    if input.title.trim().is_empty() {
      return Err(Error::InvalidArgument("title must not be empty".into()));
    }
    self.store.create_event(input).await.map_err(Error::unavailable)
  }

  /// Take (or keep) a seat at an event.
  ///
  /// The capacity pre-check here gives the common case a clean
  /// `CapacityExceeded` without a write; the store's `reserve` re-checks
  /// inside its transaction, so a concurrent racer still cannot push past
  /// the limit.
  pub async fn register(
    &self,
    event_id: Uuid,
    principal_id: Uuid,
    status: RsvpStatus,
  ) -> Result<Rsvp> {
    let event = self.event(event_id).await?;

    if event.at_capacity() {
      let holds_seat = self
        .store
        .rsvp(event_id, principal_id)
        .await
        .map_err(Error::unavailable)?
        .is_some();
      if !holds_seat {
        return Err(Error::CapacityExceeded {
          event_id,
          capacity: event.max_participants,
        });
      }
    }

    match self
      .store
      .reserve(event_id, principal_id, status)
      .await
      .map_err(Error::unavailable)?
    {
      ReserveOutcome::Reserved(rsvp) => {
        self.bump_events_stat(principal_id, 1).await;
        Ok(rsvp)
      }
      ReserveOutcome::Updated(rsvp) => Ok(rsvp),
      ReserveOutcome::Full { capacity } => {
        Err(Error::CapacityExceeded { event_id, capacity })
      }
      ReserveOutcome::NoSuchEvent => {
        Err(Error::NotFound(format!("event {event_id}")))
      }
    }
  }

  /// Switch an RSVP between `going` and `interested`. Upserts like
  /// [`register`]: the seat is kept, never double-counted.
  ///
  /// [`register`]: Reservations::register
  pub async fn set_rsvp_status(
    &self,
    event_id: Uuid,
    principal_id: Uuid,
    status: RsvpStatus,
  ) -> Result<Rsvp> {
    self.register(event_id, principal_id, status).await
  }

  /// Give the seat back. Idempotent; releasing an absent registration is a
  /// quiet no-op.
  pub async fn unregister(&self, event_id: Uuid, principal_id: Uuid) -> Result<()> {
    let released = self
      .store
      .release(event_id, principal_id)
      .await
      .map_err(Error::unavailable)?;
    if released {
      self.bump_events_stat(principal_id, -1).await;
    }
    Ok(())
  }

  pub async fn is_registered(
    &self,
    event_id: Uuid,
    principal_id: Uuid,
  ) -> Result<bool> {
    Ok(
      self
        .store
        .rsvp(event_id, principal_id)
        .await
        .map_err(Error::unavailable)?
        .is_some(),
    )
  }

  /// Every event the principal holds an RSVP for (scatter read).
  pub async fn registered_event_ids(&self, principal_id: Uuid) -> Result<Vec<Uuid>> {
    Ok(
      self
        .store
        .rsvps_for_principal(principal_id)
        .await
        .map_err(Error::unavailable)?
        .into_iter()
        .map(|r| r.event_id)
        .collect(),
    )
  }

  /// Delete an event and cascade its RSVPs, saga style.
  ///
  /// Each RSVP removal is attempted independently; failures are logged and
  /// counted but never stop the cascade, and the event document is deleted
  /// regardless.
  pub async fn delete_event(&self, event_id: Uuid) -> Result<()> {
    let _ = self.event(event_id).await?;

    let rsvps = self
      .store
      .event_rsvps(event_id)
      .await
      .map_err(Error::unavailable)?;
    let total = rsvps.len();
    let mut failed = 0usize;
    for rsvp in rsvps {
      match self.store.release(event_id, rsvp.principal_id).await {
        Ok(true) => self.bump_events_stat(rsvp.principal_id, -1).await,
        Ok(false) => {}
        Err(error) => {
          failed += 1;
          tracing::warn!(
            %error,
            principal_id = %rsvp.principal_id,
            "failed to release RSVP during event deletion"
          );
        }
      }
    }
    if failed > 0 {
      tracing::warn!(event_id = %event_id, failed, total, "event RSVP cascade left orphans");
    }

    self
      .store
      .delete_event(event_id)
      .await
      .map_err(Error::unavailable)?;
    Ok(())
  }

  /// Stat counters are best-effort by policy; drift is tolerated and only
  /// logged.
  async fn bump_events_stat(&self, principal_id: Uuid, delta: i64) {
    if let Err(error) = self
      .store
      .adjust_stat(principal_id, StatField::Events, delta)
      .await
    {
      tracing::warn!(%error, principal_id = %principal_id, "events stat adjustment failed");
    }
  }
}
