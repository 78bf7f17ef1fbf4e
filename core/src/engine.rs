//! The capacity-safe registration engine.
//!
//! Orchestrates the multi-step check-and-write protocol that keeps an
//! event from over-filling: every `register` call runs as one
//! transaction holding an exclusive row lock on the target event, so
//! the duplicate and capacity checks can never race with a concurrent
//! registration for the same event.
//!
//! The engine itself never logs; observability is the caller's
//! concern.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::error::{RegistryError, Result};
use crate::gateway::StoreGateway;
use crate::types::{EventId, Registration, UserId};

/// Capacity-safe registration engine.
///
/// Holds no process-wide mutable state; the gateway and clock are
/// injected at construction and all coordination between concurrent
/// calls happens through the store's transactional guarantees.
pub struct RegistrationEngine<G> {
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
}

impl<G> Clone for RegistrationEngine<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<G: StoreGateway> RegistrationEngine<G> {
    /// Create an engine over the given gateway and clock.
    #[must_use]
    pub fn new(gateway: Arc<G>, clock: Arc<dyn Clock>) -> Self {
        Self { gateway, clock }
    }

    /// Register `email` for the event, creating the user lazily on
    /// first contact.
    ///
    /// Runs as a single transaction with an exclusive row lock on the
    /// event, checking in fixed order: existence, temporal validity,
    /// duplicate, capacity — each short-circuiting. On any failure the
    /// whole transaction rolls back, including a user created in step
    /// three.
    ///
    /// A `Conflict` from a concurrent first-time registration with the
    /// same email is retried once with a fresh transaction; the second
    /// attempt finds the committed user and proceeds to the duplicate
    /// check.
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank name or malformed email
    /// - `NotFound` if the event does not exist
    /// - `EventInPast` if the event already started
    /// - `DuplicateRegistration` if the pair already exists
    /// - `EventFull` if the capacity is reached
    /// - `Conflict` if the email race repeats on the retry
    /// - `Timeout` if `deadline` elapses; no partial state is visible
    /// - `StoreUnavailable` / `Internal` for infrastructure faults
    pub async fn register(
        &self,
        event_id: EventId,
        name: &str,
        email: &str,
        deadline: Option<Duration>,
    ) -> Result<Registration> {
        validate_registrant(name, email)?;

        with_deadline(deadline, async {
            match self.register_once(event_id, name, email).await {
                // Two first-time registrants can race on the same email
                // outside the event row lock; the loser surfaces as a
                // Conflict. One retry sees the committed user.
                Err(RegistryError::Conflict) => self.register_once(event_id, name, email).await,
                other => other,
            }
        })
        .await
    }

    /// Cancel the registration for (event, user).
    ///
    /// A single delete; no lock is required since removing a row can
    /// never cause a capacity violation.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no such registration exists
    /// - `Timeout` if `deadline` elapses
    /// - `StoreUnavailable` / `Internal` for infrastructure faults
    pub async fn cancel(
        &self,
        event_id: EventId,
        user_id: UserId,
        deadline: Option<Duration>,
    ) -> Result<()> {
        with_deadline(deadline, async {
            if self.gateway.delete_registration(event_id, user_id).await? {
                Ok(())
            } else {
                Err(RegistryError::not_found("Registration"))
            }
        })
        .await
    }

    /// One full transaction attempt: begin, run the protocol, then
    /// commit on success or roll back on failure.
    async fn register_once(
        &self,
        event_id: EventId,
        name: &str,
        email: &str,
    ) -> Result<Registration> {
        // Evaluated once, at transaction start.
        let now = self.clock.now();

        let mut tx = self.gateway.begin().await?;
        match self.register_in_tx(&mut tx, event_id, name, email, now).await {
            Ok(registration) => {
                self.gateway.commit(tx).await?;
                Ok(registration)
            }
            Err(err) => {
                // Surface the business error even if rollback fails;
                // the store considers the transaction aborted either way.
                let _ = self.gateway.rollback(tx).await;
                Err(err)
            }
        }
    }

    async fn register_in_tx(
        &self,
        tx: &mut G::Tx,
        event_id: EventId,
        name: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Registration> {
        // 1. Exclusive row lock, held until commit or rollback.
        let event = self
            .gateway
            .lock_event_for_update(tx, event_id)
            .await?
            .ok_or(RegistryError::not_found("Event"))?;

        // 2. Temporal validity against the transaction-start instant.
        if event.date_time < now {
            return Err(RegistryError::EventInPast);
        }

        // 3. Resolve the user; an existing user's name is kept as-is.
        let user = match self.gateway.find_user_by_email(tx, email).await? {
            Some(existing) => existing,
            None => self.gateway.create_user(tx, name, email).await?,
        };

        // 4. Duplicate check.
        if self.gateway.registration_exists(tx, user.id, event_id).await? {
            return Err(RegistryError::DuplicateRegistration);
        }

        // 5. Capacity check under the lock: a consistent snapshot.
        let taken = self.gateway.count_registrations_in_tx(tx, event_id).await?;
        if taken >= event.capacity {
            return Err(RegistryError::EventFull);
        }

        // 6. Insert; commit happens in the caller.
        self.gateway.insert_registration(tx, user.id, event_id).await?;

        Ok(Registration {
            user_id: user.id,
            event_id,
        })
    }
}

/// Run `fut` under an optional caller-supplied deadline. On expiry the
/// future is dropped, which rolls back any transaction it holds, and
/// `Timeout` is returned.
async fn with_deadline<T>(
    deadline: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match deadline {
        None => fut.await,
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| RegistryError::Timeout)?,
    }
}

fn validate_registrant(name: &str, email: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RegistryError::validation("name", "must not be empty"));
    }
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| RegistryError::validation("email", "must contain '@'"))?;
    if local.trim().is_empty() || domain.trim().is_empty() {
        return Err(RegistryError::validation(
            "email",
            "must have a local part and a domain",
        ));
    }
    Ok(())
}
