//! Domain types for events, users, and registrations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum capacity an event may declare.
pub const MAX_CAPACITY: u32 = 1000;

// ═══════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    /// Generate a new random `EventId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random `UserId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Entities
// ═══════════════════════════════════════════════════════════════════════

/// A scheduled event with a fixed attendee capacity.
///
/// Capacity bounds (1..=[`MAX_CAPACITY`]) are enforced at creation and
/// the field is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Generated identifier.
    pub id: EventId,
    /// Non-empty display title.
    pub title: String,
    /// When the event takes place.
    pub date_time: DateTime<Utc>,
    /// Non-empty venue description.
    pub location: String,
    /// Maximum number of distinct registered users.
    pub capacity: u32,
}

/// A registrant, deduplicated across events by email.
///
/// Created lazily on first registration; the stored name is never
/// overwritten by later registrations carrying a different name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Generated identifier.
    pub id: UserId,
    /// Name supplied on first registration.
    pub name: String,
    /// Unique key across all users.
    pub email: String,
}

/// The persisted fact that a user is registered for an event.
///
/// Unique on the (user, event) pair; immutable once created except for
/// deletion through cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// The registered user.
    pub user_id: UserId,
    /// The event registered for.
    pub event_id: EventId,
}

// ═══════════════════════════════════════════════════════════════════════
// Read models
// ═══════════════════════════════════════════════════════════════════════

/// An event together with its registered users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDetails {
    /// The event itself.
    pub event: Event,
    /// All users currently registered.
    pub registered_users: Vec<User>,
}

/// Derived occupancy figures for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventStats {
    /// Committed registrations.
    pub total_registrations: u32,
    /// `capacity - total_registrations`.
    pub remaining_capacity: u32,
    /// `round(100 * total / capacity)`, half-up.
    pub percent_full: u32,
}
