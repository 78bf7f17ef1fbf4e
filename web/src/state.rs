//! Shared application state handed to every handler.

use std::sync::Arc;
use std::time::Duration;

use gather_core::{Clock, EventService, RegistrationEngine, StoreGateway};

/// Application state: the two core services plus the dispatcher-level
/// policy knobs (clock, per-request deadline).
pub struct AppState<G> {
    /// Capacity-safe registration engine.
    pub engine: RegistrationEngine<G>,
    /// Event lifecycle service.
    pub events: EventService<G>,
    /// Clock used for the upcoming-events cutoff.
    pub clock: Arc<dyn Clock>,
    /// Deadline passed to every engine call; `None` disables it.
    pub deadline: Option<Duration>,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            events: self.events.clone(),
            clock: Arc::clone(&self.clock),
            deadline: self.deadline,
        }
    }
}

impl<G: StoreGateway> AppState<G> {
    /// Assemble the state over one gateway.
    #[must_use]
    pub fn new(gateway: Arc<G>, clock: Arc<dyn Clock>, deadline: Option<Duration>) -> Self {
        Self {
            engine: RegistrationEngine::new(Arc::clone(&gateway), Arc::clone(&clock)),
            events: EventService::new(gateway),
            clock,
            deadline,
        }
    }
}
