//! Error types for event creation and attendee registration.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Error taxonomy for the registration core.
///
/// Every failure crossing the core boundary is returned as one of
/// these values; nothing is panicked across it. Business-rule
/// rejections (`EventInPast`, `DuplicateRegistration`, `EventFull`)
/// are all recoverable by the caller choosing a different action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    // ═══════════════════════════════════════════════════════════
    // Input validation
    // ═══════════════════════════════════════════════════════════

    /// A caller-supplied field is missing or out of range.
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// The offending field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Business-rule rejections
    // ═══════════════════════════════════════════════════════════

    /// The referenced event or registration does not exist.
    #[error("{resource} not found")]
    NotFound {
        /// Kind of record that was missing.
        resource: &'static str,
    },

    /// The event's start time has already passed.
    #[error("Cannot register for past event")]
    EventInPast,

    /// The user already holds a registration for this event.
    #[error("User already registered for this event")]
    DuplicateRegistration,

    /// The event has reached its capacity.
    #[error("Event is full")]
    EventFull,

    // ═══════════════════════════════════════════════════════════
    // Concurrency
    // ═══════════════════════════════════════════════════════════

    /// A unique-constraint violation outside the row lock's reach,
    /// e.g. two first-time registrants racing on the same email.
    #[error("Concurrent write conflict")]
    Conflict,

    /// The caller-supplied deadline elapsed before commit; the
    /// transaction was rolled back.
    #[error("Operation timed out")]
    Timeout,

    // ═══════════════════════════════════════════════════════════
    // Infrastructure
    // ═══════════════════════════════════════════════════════════

    /// The data store is temporarily unreachable. Retrying is the
    /// caller's policy, never the engine's.
    #[error("Data store unavailable: {0}")]
    StoreUnavailable(String),

    /// Unexpected lower-level fault; the transaction was rolled back
    /// before this was propagated.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RegistryError {
    /// Shorthand for a [`RegistryError::Validation`] value.
    #[must_use]
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`RegistryError::NotFound`] value.
    #[must_use]
    pub const fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }
}
