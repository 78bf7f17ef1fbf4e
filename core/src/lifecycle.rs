//! Event lifecycle: creation, detail reads, upcoming listing, stats.
//!
//! Simpler than registration — no cross-entity races, so every
//! operation here is a single statement or a pair of plain reads.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{RegistryError, Result};
use crate::gateway::StoreGateway;
use crate::types::{Event, EventDetails, EventId, EventStats, MAX_CAPACITY};

/// Event lifecycle service.
pub struct EventService<G> {
    gateway: Arc<G>,
}

impl<G> Clone for EventService<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<G: StoreGateway> EventService<G> {
    /// Create a service over the given gateway.
    #[must_use]
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Validate and persist a new event, returning its generated id.
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank title/location or capacity outside
    ///   `1..=MAX_CAPACITY`
    /// - `StoreUnavailable` / `Internal` for infrastructure faults
    pub async fn create(
        &self,
        title: &str,
        date_time: DateTime<Utc>,
        location: &str,
        capacity: u32,
    ) -> Result<EventId> {
        if title.trim().is_empty() {
            return Err(RegistryError::validation("title", "must not be empty"));
        }
        if location.trim().is_empty() {
            return Err(RegistryError::validation("location", "must not be empty"));
        }
        if !(1..=MAX_CAPACITY).contains(&capacity) {
            return Err(RegistryError::validation(
                "capacity",
                format!("must be between 1 and {MAX_CAPACITY}"),
            ));
        }

        let event = Event {
            id: EventId::new(),
            title: title.to_owned(),
            date_time,
            location: location.to_owned(),
            capacity,
        };
        self.gateway.insert_event(&event).await?;
        Ok(event.id)
    }

    /// Fetch an event together with its registered users.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the event does not exist
    /// - `StoreUnavailable` / `Internal` for infrastructure faults
    pub async fn get_details(&self, event_id: EventId) -> Result<EventDetails> {
        let event = self
            .gateway
            .find_event(event_id)
            .await?
            .ok_or(RegistryError::not_found("Event"))?;
        let registered_users = self.gateway.list_attendees(event_id).await?;
        Ok(EventDetails {
            event,
            registered_users,
        })
    }

    /// All events strictly after `now`, ordered by (`date_time`
    /// ascending, `location` ascending). Eagerly materialized.
    ///
    /// # Errors
    ///
    /// - `StoreUnavailable` / `Internal` for infrastructure faults
    pub async fn list_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        self.gateway.list_upcoming(now).await
    }

    /// Derived occupancy figures for the event.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the event does not exist
    /// - `StoreUnavailable` / `Internal` for infrastructure faults
    pub async fn get_stats(&self, event_id: EventId) -> Result<EventStats> {
        let event = self
            .gateway
            .find_event(event_id)
            .await?
            .ok_or(RegistryError::not_found("Event"))?;
        let total = self.gateway.count_registrations(event_id).await?;
        Ok(EventStats {
            total_registrations: total,
            remaining_capacity: event.capacity.saturating_sub(total),
            percent_full: percent_full(total, event.capacity),
        })
    }
}

/// Round-half-up percentage without going through floats.
///
/// `capacity >= 1` is enforced at creation, so the division is safe.
const fn percent_full(total: u32, capacity: u32) -> u32 {
    (200 * total + capacity) / (2 * capacity)
}
