//! In-memory gateway with real transaction semantics.
//!
//! The mock reproduces the two store behaviors the engine's
//! correctness rests on: an exclusive per-event row lock held for the
//! transaction's duration, and staged writes that only become visible
//! on commit. Dropping a transaction mid-flight discards its writes
//! and releases its locks, matching rollback-on-drop stores.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::{RegistryError, Result};
use crate::gateway::StoreGateway;
use crate::types::{Event, EventId, User, UserId};

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<EventId, Event>,
    users: HashMap<UserId, User>,
    users_by_email: HashMap<String, UserId>,
    registrations: HashSet<(UserId, EventId)>,
}

/// One in-flight mock transaction: held row locks plus staged writes.
pub struct MockTx {
    row_locks: Vec<OwnedMutexGuard<()>>,
    staged_users: Vec<User>,
    staged_registrations: Vec<(UserId, EventId)>,
}

/// In-memory [`StoreGateway`] for tests.
///
/// Supports failure injection (`set_unavailable`,
/// `fail_next_user_insert`) and an artificial commit delay for
/// exercising deadline handling.
#[derive(Clone, Default)]
pub struct MockGateway {
    tables: Arc<Mutex<Tables>>,
    locks: Arc<Mutex<HashMap<EventId, Arc<AsyncMutex<()>>>>>,
    user_insert_failures: Arc<Mutex<Vec<RegistryError>>>,
    commit_delay: Arc<Mutex<Option<Duration>>>,
    unavailable: Arc<Mutex<bool>>,
}

impl MockGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `begin` fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut flag) = self.unavailable.lock() {
            *flag = unavailable;
        }
    }

    /// Queue an error for the next `create_user` call. Queued errors
    /// are consumed front first.
    pub fn fail_next_user_insert(&self, err: RegistryError) {
        if let Ok(mut queue) = self.user_insert_failures.lock() {
            queue.push(err);
        }
    }

    /// Sleep for `delay` inside every commit, or disable with `None`.
    pub fn set_commit_delay(&self, delay: Option<Duration>) {
        if let Ok(mut slot) = self.commit_delay.lock() {
            *slot = delay;
        }
    }

    /// Insert a user directly, as if another transaction committed it.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the email is already taken.
    pub fn seed_user(&self, user: User) -> Result<()> {
        let mut tables = self.tables()?;
        if tables.users_by_email.contains_key(&user.email) {
            return Err(RegistryError::Conflict);
        }
        tables.users_by_email.insert(user.email.clone(), user.id);
        tables.users.insert(user.id, user);
        Ok(())
    }

    /// Committed user for `email`, if any.
    #[must_use]
    pub fn user_by_email(&self, email: &str) -> Option<User> {
        let tables = self.tables().ok()?;
        let id = tables.users_by_email.get(email)?;
        tables.users.get(id).cloned()
    }

    /// Committed registration count for `event_id`.
    #[must_use]
    pub fn registration_count(&self, event_id: EventId) -> usize {
        self.tables().map_or(0, |tables| {
            tables
                .registrations
                .iter()
                .filter(|(_, event)| *event == event_id)
                .count()
        })
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| RegistryError::Internal("mock tables lock poisoned".to_owned()))
    }

    fn check_available(&self) -> Result<()> {
        let offline = self
            .unavailable
            .lock()
            .map_err(|_| RegistryError::Internal("mock flag lock poisoned".to_owned()))?;
        if *offline {
            return Err(RegistryError::StoreUnavailable(
                "mock store offline".to_owned(),
            ));
        }
        Ok(())
    }

    fn row_lock_cell(&self, id: EventId) -> Result<Arc<AsyncMutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| RegistryError::Internal("mock row-lock table poisoned".to_owned()))?;
        Ok(Arc::clone(locks.entry(id).or_default()))
    }
}

impl StoreGateway for MockGateway {
    type Tx = MockTx;

    async fn begin(&self) -> Result<MockTx> {
        self.check_available()?;
        Ok(MockTx {
            row_locks: Vec::new(),
            staged_users: Vec::new(),
            staged_registrations: Vec::new(),
        })
    }

    async fn commit(&self, tx: MockTx) -> Result<()> {
        let delay = *self
            .commit_delay
            .lock()
            .map_err(|_| RegistryError::Internal("mock delay lock poisoned".to_owned()))?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut tables = self.tables()?;
        for user in &tx.staged_users {
            // A winner committed the same email while this transaction
            // was in flight.
            if tables.users_by_email.contains_key(&user.email) {
                return Err(RegistryError::Conflict);
            }
        }
        for user in tx.staged_users {
            tables.users_by_email.insert(user.email.clone(), user.id);
            tables.users.insert(user.id, user);
        }
        for pair in tx.staged_registrations {
            if !tables.registrations.insert(pair) {
                return Err(RegistryError::DuplicateRegistration);
            }
        }
        drop(tables);
        // Row locks in `tx` are released here, after the writes landed.
        Ok(())
    }

    async fn rollback(&self, tx: MockTx) -> Result<()> {
        drop(tx);
        Ok(())
    }

    async fn lock_event_for_update(&self, tx: &mut MockTx, id: EventId) -> Result<Option<Event>> {
        let cell = self.row_lock_cell(id)?;
        let guard = cell.lock_owned().await;
        tx.row_locks.push(guard);
        Ok(self.tables()?.events.get(&id).cloned())
    }

    async fn find_user_by_email(&self, tx: &mut MockTx, email: &str) -> Result<Option<User>> {
        if let Some(staged) = tx.staged_users.iter().find(|user| user.email == email) {
            return Ok(Some(staged.clone()));
        }
        let tables = self.tables()?;
        Ok(tables
            .users_by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn create_user(&self, tx: &mut MockTx, name: &str, email: &str) -> Result<User> {
        if let Ok(mut queue) = self.user_insert_failures.lock() {
            if !queue.is_empty() {
                return Err(queue.remove(0));
            }
        }
        if self.tables()?.users_by_email.contains_key(email) {
            return Err(RegistryError::Conflict);
        }
        let user = User {
            id: UserId::new(),
            name: name.to_owned(),
            email: email.to_owned(),
        };
        tx.staged_users.push(user.clone());
        Ok(user)
    }

    async fn registration_exists(
        &self,
        tx: &mut MockTx,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<bool> {
        if tx.staged_registrations.contains(&(user_id, event_id)) {
            return Ok(true);
        }
        Ok(self.tables()?.registrations.contains(&(user_id, event_id)))
    }

    async fn count_registrations_in_tx(&self, tx: &mut MockTx, event_id: EventId) -> Result<u32> {
        let committed = self.registration_count(event_id);
        let staged = tx
            .staged_registrations
            .iter()
            .filter(|(_, event)| *event == event_id)
            .count();
        u32::try_from(committed + staged)
            .map_err(|_| RegistryError::Internal("registration count overflow".to_owned()))
    }

    async fn insert_registration(
        &self,
        tx: &mut MockTx,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<()> {
        tx.staged_registrations.push((user_id, event_id));
        Ok(())
    }

    async fn delete_registration(&self, event_id: EventId, user_id: UserId) -> Result<bool> {
        self.check_available()?;
        Ok(self.tables()?.registrations.remove(&(user_id, event_id)))
    }

    async fn insert_event(&self, event: &Event) -> Result<()> {
        self.check_available()?;
        let mut tables = self.tables()?;
        if tables.events.contains_key(&event.id) {
            return Err(RegistryError::Internal("duplicate event id".to_owned()));
        }
        tables.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn find_event(&self, id: EventId) -> Result<Option<Event>> {
        self.check_available()?;
        Ok(self.tables()?.events.get(&id).cloned())
    }

    async fn list_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        self.check_available()?;
        let mut upcoming: Vec<Event> = self
            .tables()?
            .events
            .values()
            .filter(|event| event.date_time > now)
            .cloned()
            .collect();
        upcoming.sort_by(|a, b| {
            a.date_time
                .cmp(&b.date_time)
                .then_with(|| a.location.cmp(&b.location))
        });
        Ok(upcoming)
    }

    async fn list_attendees(&self, event_id: EventId) -> Result<Vec<User>> {
        self.check_available()?;
        let tables = self.tables()?;
        let mut attendees: Vec<User> = tables
            .registrations
            .iter()
            .filter(|(_, event)| *event == event_id)
            .filter_map(|(user_id, _)| tables.users.get(user_id))
            .cloned()
            .collect();
        attendees.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(attendees)
    }

    async fn count_registrations(&self, event_id: EventId) -> Result<u32> {
        self.check_available()?;
        u32::try_from(self.registration_count(event_id))
            .map_err(|_| RegistryError::Internal("registration count overflow".to_owned()))
    }
}
