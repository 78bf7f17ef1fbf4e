//! Axum request dispatcher for the gather registration core.
//!
//! This crate is the thin outer shell: it parses HTTP inputs into
//! validated primitives, forwards them to the core services, and maps
//! each tagged error back to a transport-level status. All business
//! rules, including the capacity-safe registration transaction, live
//! in `gather-core`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use state::AppState;

use axum::routing::{delete, get, post};
use axum::Router;
use gather_core::StoreGateway;
use tower_http::trace::TraceLayer;

/// Build the event-management router over the given state.
#[must_use]
pub fn router<G: StoreGateway>(state: AppState<G>) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/events", post(handlers::create_event::<G>))
        .route("/events/upcoming/list", get(handlers::list_upcoming::<G>))
        .route("/events/:id", get(handlers::get_event_details::<G>))
        .route("/events/:id/stats", get(handlers::get_event_stats::<G>))
        .route("/events/:id/register", post(handlers::register::<G>))
        .route(
            "/events/:id/register/:user_id",
            delete(handlers::cancel::<G>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
