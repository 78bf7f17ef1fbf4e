//! # Gather Core
//!
//! Event creation and attendee registration with strict capacity
//! enforcement.
//!
//! The heart of this crate is the [`RegistrationEngine`]: a multi-step
//! check-and-write protocol executed as a single atomic transaction
//! against a data store, so that an event never over-fills, a user
//! never double-registers, and registration for a past event never
//! succeeds — even under concurrent load.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │        Request Dispatcher (HTTP)         │  ← gather-web
//! ├──────────────────────────────────────────┤
//! │  RegistrationEngine │ EventService       │  ← this crate
//! ├──────────────────────────────────────────┤
//! │  StoreGateway (transactional contract)   │  ← this crate (trait)
//! ├──────────────────────────────────────────┤
//! │  PostgreSQL / in-memory mock             │  ← gather-postgres, mocks
//! └──────────────────────────────────────────┘
//! ```
//!
//! The engine holds no process-wide mutable state; all coordination
//! between concurrent calls happens through the store's transactional
//! guarantees, most importantly the exclusive row lock taken on the
//! target event via [`StoreGateway::lock_event_for_update`].
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gather_core::{RegistrationEngine, EventService, SystemClock};
//!
//! let gateway = Arc::new(make_gateway());
//! let clock = Arc::new(SystemClock);
//! let events = EventService::new(Arc::clone(&gateway));
//! let engine = RegistrationEngine::new(gateway, clock);
//!
//! let event_id = events.create("RustConf", date_time, "Berlin", 300).await?;
//! let registration = engine.register(event_id, "Alice", "alice@example.com", None).await?;
//! ```

pub mod clock;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod types;

#[cfg(feature = "test-utils")]
pub mod mocks;

pub use clock::{Clock, SystemClock};
pub use engine::RegistrationEngine;
pub use error::{RegistryError, Result};
pub use gateway::StoreGateway;
pub use lifecycle::EventService;
pub use types::{
    Event, EventDetails, EventId, EventStats, Registration, User, UserId, MAX_CAPACITY,
};
