//! Request handlers: parse inputs, forward validated primitives to the
//! core, and shape the JSON responses. Deliberately thin.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use gather_core::{Event, EventId, StoreGateway, User, UserId};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// `GET /` — liveness probe.
pub async fn health() -> &'static str {
    "Event management API is running"
}

// ═══════════════════════════════════════════════════════════════════════
// Create event
// ═══════════════════════════════════════════════════════════════════════

/// Body for `POST /events`.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Event title.
    pub title: Option<String>,
    /// When the event takes place.
    pub date_time: Option<DateTime<Utc>>,
    /// Venue description.
    pub location: Option<String>,
    /// Attendee capacity.
    pub capacity: Option<i64>,
}

/// Response for `POST /events`.
#[derive(Debug, Serialize)]
pub struct CreateEventResponse {
    /// Human-readable confirmation.
    pub message: &'static str,
    /// Generated event id.
    pub event_id: EventId,
}

/// `POST /events`
///
/// # Errors
///
/// 400 for missing fields or invalid capacity.
pub async fn create_event<G: StoreGateway>(
    State(state): State<AppState<G>>,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<CreateEventResponse>), AppError> {
    let (Some(title), Some(date_time), Some(location), Some(capacity)) =
        (req.title, req.date_time, req.location, req.capacity)
    else {
        return Err(AppError::bad_request("All fields are required"));
    };
    let capacity = u32::try_from(capacity).map_err(|_| {
        AppError::from(gather_core::RegistryError::validation(
            "capacity",
            "must be between 1 and 1000",
        ))
    })?;

    let event_id = state
        .events
        .create(&title, date_time, &location, capacity)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateEventResponse {
            message: "Event created successfully",
            event_id,
        }),
    ))
}

// ═══════════════════════════════════════════════════════════════════════
// Event details / listing / stats
// ═══════════════════════════════════════════════════════════════════════

/// A registered user as exposed over the API.
#[derive(Debug, Serialize)]
pub struct AttendeeDto {
    /// User id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl From<User> for AttendeeDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Response for `GET /events/:id`.
#[derive(Debug, Serialize)]
pub struct EventDetailsResponse {
    /// Event id.
    pub id: EventId,
    /// Event title.
    pub title: String,
    /// When the event takes place.
    pub date_time: DateTime<Utc>,
    /// Venue description.
    pub location: String,
    /// Attendee capacity.
    pub capacity: u32,
    /// Users currently registered.
    pub registered_users: Vec<AttendeeDto>,
}

/// `GET /events/:id`
///
/// # Errors
///
/// 404 if the event does not exist.
pub async fn get_event_details<G: StoreGateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<EventId>,
) -> Result<Json<EventDetailsResponse>, AppError> {
    let details = state.events.get_details(id).await?;
    Ok(Json(EventDetailsResponse {
        id: details.event.id,
        title: details.event.title,
        date_time: details.event.date_time,
        location: details.event.location,
        capacity: details.event.capacity,
        registered_users: details
            .registered_users
            .into_iter()
            .map(AttendeeDto::from)
            .collect(),
    }))
}

/// Response for `GET /events/upcoming/list`.
#[derive(Debug, Serialize)]
pub struct UpcomingEventsResponse {
    /// Events strictly after now, soonest first.
    pub upcoming_events: Vec<Event>,
}

/// `GET /events/upcoming/list`
///
/// # Errors
///
/// 503 if the store is unreachable.
pub async fn list_upcoming<G: StoreGateway>(
    State(state): State<AppState<G>>,
) -> Result<Json<UpcomingEventsResponse>, AppError> {
    let upcoming_events = state.events.list_upcoming(state.clock.now()).await?;
    Ok(Json(UpcomingEventsResponse { upcoming_events }))
}

/// Response for `GET /events/:id/stats`.
#[derive(Debug, Serialize)]
pub struct EventStatsResponse {
    /// Committed registrations.
    pub total_registrations: u32,
    /// Capacity minus registrations.
    pub remaining_capacity: u32,
    /// Rounded occupancy percentage.
    pub percent_full: u32,
}

/// `GET /events/:id/stats`
///
/// # Errors
///
/// 404 if the event does not exist.
pub async fn get_event_stats<G: StoreGateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<EventId>,
) -> Result<Json<EventStatsResponse>, AppError> {
    let stats = state.events.get_stats(id).await?;
    Ok(Json(EventStatsResponse {
        total_registrations: stats.total_registrations,
        remaining_capacity: stats.remaining_capacity,
        percent_full: stats.percent_full,
    }))
}

// ═══════════════════════════════════════════════════════════════════════
// Register / cancel
// ═══════════════════════════════════════════════════════════════════════

/// Body for `POST /events/:id/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Registrant name, used only on first contact.
    pub name: Option<String>,
    /// Registrant email, the deduplication key.
    pub email: Option<String>,
}

/// Response for `POST /events/:id/register`.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Human-readable confirmation.
    pub message: &'static str,
    /// The registered user (needed for cancellation).
    pub user_id: UserId,
    /// The event registered for.
    pub event_id: EventId,
}

/// `POST /events/:id/register`
///
/// # Errors
///
/// 400 for missing fields, 404 for an unknown event, 403 for a past or
/// full event, 409 for a duplicate registration.
pub async fn register<G: StoreGateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<EventId>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let (Some(name), Some(email)) = (req.name, req.email) else {
        return Err(AppError::bad_request("Name and email are required"));
    };

    let registration = state
        .engine
        .register(id, &name, &email, state.deadline)
        .await?;
    Ok(Json(RegisterResponse {
        message: "User registered successfully",
        user_id: registration.user_id,
        event_id: registration.event_id,
    }))
}

/// Response for `DELETE /events/:id/register/:user_id`.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    /// Human-readable confirmation.
    pub message: &'static str,
}

/// `DELETE /events/:id/register/:user_id`
///
/// # Errors
///
/// 404 if the user is not registered for the event.
pub async fn cancel<G: StoreGateway>(
    State(state): State<AppState<G>>,
    Path((id, user_id)): Path<(EventId, UserId)>,
) -> Result<Json<CancelResponse>, AppError> {
    state.engine.cancel(id, user_id, state.deadline).await?;
    Ok(Json(CancelResponse {
        message: "Registration cancelled successfully",
    }))
}
