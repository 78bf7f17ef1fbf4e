//! Transactional contract between the core and the data store.
//!
//! The gateway returns plain data and exposes row locking as an
//! explicit primitive, keeping the engine free of any
//! persistence-framework coupling. Implementations are expected to
//! honor ACID transactions at read-committed isolation or stronger,
//! with row-level locking.

use crate::error::Result;
use crate::types::{Event, EventId, User, UserId};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Data store gateway.
///
/// The transactional half of this trait (everything taking a
/// `&mut Self::Tx`) is driven by the
/// [`RegistrationEngine`](crate::engine::RegistrationEngine); the
/// plain reads at the bottom serve the
/// [`EventService`](crate::lifecycle::EventService), which never needs
/// a multi-statement transaction.
pub trait StoreGateway: Send + Sync + 'static {
    /// Handle for one in-flight transaction.
    ///
    /// Dropping the handle without committing must roll the
    /// transaction back and release every row lock it holds.
    type Tx: Send;

    // ─────────────────────────────────────────────────────────────
    // Transaction control
    // ─────────────────────────────────────────────────────────────

    /// Open a transaction at read-committed isolation or stronger.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if no connection can be obtained.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx>> + Send;

    /// Commit the transaction, making its writes visible atomically.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if a deferred unique constraint fired at
    /// commit time, or an infrastructure error otherwise.
    fn commit(&self, tx: Self::Tx) -> impl Future<Output = Result<()>> + Send;

    /// Roll the transaction back, discarding all of its writes.
    ///
    /// # Errors
    ///
    /// Returns an infrastructure error if the rollback itself fails;
    /// the store must still consider the transaction aborted.
    fn rollback(&self, tx: Self::Tx) -> impl Future<Output = Result<()>> + Send;

    // ─────────────────────────────────────────────────────────────
    // In-transaction operations (registration protocol)
    // ─────────────────────────────────────────────────────────────

    /// Load an event and take an exclusive row lock on it, held until
    /// the transaction commits or rolls back.
    ///
    /// Maps to `SELECT … FOR UPDATE` or the store's equivalent. This
    /// lock is what serializes concurrent registration attempts for
    /// the same event.
    ///
    /// # Errors
    ///
    /// Returns an infrastructure error if the query fails.
    fn lock_event_for_update(
        &self,
        tx: &mut Self::Tx,
        id: EventId,
    ) -> impl Future<Output = Result<Option<Event>>> + Send;

    /// Look up a user by their unique email.
    ///
    /// # Errors
    ///
    /// Returns an infrastructure error if the query fails.
    fn find_user_by_email(
        &self,
        tx: &mut Self::Tx,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Create a user with a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if another transaction committed the same
    /// email concurrently, or an infrastructure error otherwise.
    fn create_user(
        &self,
        tx: &mut Self::Tx,
        name: &str,
        email: &str,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Whether a registration exists for the (user, event) pair.
    ///
    /// # Errors
    ///
    /// Returns an infrastructure error if the query fails.
    fn registration_exists(
        &self,
        tx: &mut Self::Tx,
        user_id: UserId,
        event_id: EventId,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Count committed registrations for the event, as seen inside
    /// this transaction. Called with the event row lock held, so the
    /// count is a consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns an infrastructure error if the query fails.
    fn count_registrations_in_tx(
        &self,
        tx: &mut Self::Tx,
        event_id: EventId,
    ) -> impl Future<Output = Result<u32>> + Send;

    /// Insert the registration row.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRegistration` if the pair already exists, or
    /// an infrastructure error otherwise.
    fn insert_registration(
        &self,
        tx: &mut Self::Tx,
        user_id: UserId,
        event_id: EventId,
    ) -> impl Future<Output = Result<()>> + Send;

    // ─────────────────────────────────────────────────────────────
    // Single-statement operations
    // ─────────────────────────────────────────────────────────────

    /// Delete the registration for (event, user).
    ///
    /// Returns `false` when no such registration existed. Relies only
    /// on the delete's own atomicity; removing a row can never violate
    /// capacity.
    ///
    /// # Errors
    ///
    /// Returns an infrastructure error if the statement fails.
    fn delete_registration(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Persist a freshly validated event.
    ///
    /// # Errors
    ///
    /// Returns an infrastructure error if the insert fails.
    fn insert_event(&self, event: &Event) -> impl Future<Output = Result<()>> + Send;

    /// Fetch an event by id.
    ///
    /// # Errors
    ///
    /// Returns an infrastructure error if the query fails.
    fn find_event(&self, id: EventId) -> impl Future<Output = Result<Option<Event>>> + Send;

    /// All events strictly after `now`, ordered by
    /// (`date_time` ascending, `location` ascending).
    ///
    /// # Errors
    ///
    /// Returns an infrastructure error if the query fails.
    fn list_upcoming(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Event>>> + Send;

    /// All users registered for the event, in a stable order.
    ///
    /// # Errors
    ///
    /// Returns an infrastructure error if the query fails.
    fn list_attendees(&self, event_id: EventId) -> impl Future<Output = Result<Vec<User>>> + Send;

    /// Count committed registrations for the event outside any
    /// transaction (read-side statistics only).
    ///
    /// # Errors
    ///
    /// Returns an infrastructure error if the query fails.
    fn count_registrations(&self, event_id: EventId)
    -> impl Future<Output = Result<u32>> + Send;
}
