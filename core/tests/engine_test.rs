//! Integration tests for the registration engine against the mock
//! gateway, which reproduces row locking and commit/rollback.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gather_core::mocks::{FixedClock, MockGateway};
use gather_core::{
    EventId, EventService, RegistrationEngine, RegistryError, User, UserId,
};

const NOW_SECS: i64 = 1_700_000_000;

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(NOW_SECS, 0).unwrap()
}

fn setup() -> (
    Arc<MockGateway>,
    RegistrationEngine<MockGateway>,
    EventService<MockGateway>,
) {
    let gateway = Arc::new(MockGateway::new());
    let clock = Arc::new(FixedClock::at_epoch_seconds(NOW_SECS));
    let engine = RegistrationEngine::new(Arc::clone(&gateway), clock);
    let service = EventService::new(Arc::clone(&gateway));
    (gateway, engine, service)
}

async fn future_event(service: &EventService<MockGateway>, capacity: u32) -> EventId {
    service
        .create(
            "RustConf",
            now() + chrono::Duration::days(7),
            "Berlin",
            capacity,
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn register_creates_user_and_registration() {
    let (gateway, engine, service) = setup();
    let event_id = future_event(&service, 10).await;

    let registration = engine
        .register(event_id, "Alice", "alice@example.com", None)
        .await
        .unwrap();

    assert_eq!(registration.event_id, event_id);
    let user = gateway.user_by_email("alice@example.com").unwrap();
    assert_eq!(user.id, registration.user_id);
    assert_eq!(user.name, "Alice");
    assert_eq!(gateway.registration_count(event_id), 1);
}

#[tokio::test]
async fn register_unknown_event_is_not_found() {
    let (_, engine, _) = setup();

    let err = engine
        .register(EventId::new(), "Alice", "alice@example.com", None)
        .await
        .unwrap_err();

    assert_eq!(err, RegistryError::not_found("Event"));
}

#[tokio::test]
async fn register_past_event_is_rejected_regardless_of_capacity() {
    let (gateway, engine, service) = setup();
    let event_id = service
        .create("Retro", now() - chrono::Duration::hours(1), "Paris", 1000)
        .await
        .unwrap();

    let err = engine
        .register(event_id, "Alice", "alice@example.com", None)
        .await
        .unwrap_err();

    assert_eq!(err, RegistryError::EventInPast);
    // The lazily created user must not survive the rollback.
    assert!(gateway.user_by_email("alice@example.com").is_none());
}

#[tokio::test]
async fn event_starting_exactly_now_still_accepts_registrations() {
    let (_, engine, service) = setup();
    let event_id = service.create("Kickoff", now(), "Lisbon", 5).await.unwrap();

    assert!(engine
        .register(event_id, "Alice", "alice@example.com", None)
        .await
        .is_ok());
}

#[tokio::test]
async fn registering_twice_yields_duplicate() {
    let (gateway, engine, service) = setup();
    let event_id = future_event(&service, 10).await;

    engine
        .register(event_id, "Alice", "alice@example.com", None)
        .await
        .unwrap();
    let err = engine
        .register(event_id, "Alice", "alice@example.com", None)
        .await
        .unwrap_err();

    assert_eq!(err, RegistryError::DuplicateRegistration);
    assert_eq!(gateway.registration_count(event_id), 1);
}

#[tokio::test]
async fn full_event_rejects_further_registrations() {
    let (gateway, engine, service) = setup();
    let event_id = future_event(&service, 1).await;

    engine
        .register(event_id, "Alice", "alice@example.com", None)
        .await
        .unwrap();
    let err = engine
        .register(event_id, "Bob", "bob@example.com", None)
        .await
        .unwrap_err();

    assert_eq!(err, RegistryError::EventFull);
    assert_eq!(gateway.registration_count(event_id), 1);
    // Bob's user creation happened inside the rolled-back transaction.
    assert!(gateway.user_by_email("bob@example.com").is_none());
}

#[tokio::test]
async fn existing_user_name_is_not_overwritten() {
    let (gateway, engine, service) = setup();
    let first = future_event(&service, 10).await;
    let second = future_event(&service, 10).await;

    engine
        .register(first, "Alice", "alice@example.com", None)
        .await
        .unwrap();
    engine
        .register(second, "Alicia", "alice@example.com", None)
        .await
        .unwrap();

    let user = gateway.user_by_email("alice@example.com").unwrap();
    assert_eq!(user.name, "Alice");
}

#[tokio::test]
async fn cancel_then_register_counts_once() {
    let (gateway, engine, service) = setup();
    let event_id = future_event(&service, 10).await;

    let registration = engine
        .register(event_id, "Alice", "alice@example.com", None)
        .await
        .unwrap();
    engine
        .cancel(event_id, registration.user_id, None)
        .await
        .unwrap();
    assert_eq!(gateway.registration_count(event_id), 0);

    engine
        .register(event_id, "Alice", "alice@example.com", None)
        .await
        .unwrap();
    assert_eq!(gateway.registration_count(event_id), 1);
}

#[tokio::test]
async fn cancel_without_registration_is_not_found() {
    let (_, engine, service) = setup();
    let event_id = future_event(&service, 10).await;

    let err = engine
        .cancel(event_id, UserId::new(), None)
        .await
        .unwrap_err();

    assert_eq!(err, RegistryError::not_found("Registration"));
}

#[tokio::test]
async fn email_conflict_is_retried_once() {
    let (gateway, engine, service) = setup();
    let event_id = future_event(&service, 10).await;

    // Another first-time registrant with the same email wins the race:
    // our insert fails with Conflict and their user is already
    // committed when the retry runs.
    let winner = User {
        id: UserId::new(),
        name: "Alice".to_owned(),
        email: "alice@example.com".to_owned(),
    };
    gateway.fail_next_user_insert(RegistryError::Conflict);
    gateway.seed_user(winner.clone()).unwrap();

    let registration = engine
        .register(event_id, "Alice", "alice@example.com", None)
        .await
        .unwrap();

    assert_eq!(registration.user_id, winner.id);
    assert_eq!(gateway.registration_count(event_id), 1);
}

#[tokio::test]
async fn repeated_conflict_is_surfaced() {
    let (gateway, engine, service) = setup();
    let event_id = future_event(&service, 10).await;

    gateway.fail_next_user_insert(RegistryError::Conflict);
    gateway.fail_next_user_insert(RegistryError::Conflict);

    let err = engine
        .register(event_id, "Alice", "alice@example.com", None)
        .await
        .unwrap_err();

    assert_eq!(err, RegistryError::Conflict);
    assert_eq!(gateway.registration_count(event_id), 0);
}

#[tokio::test]
async fn deadline_expiry_rolls_back_and_releases_the_lock() {
    let (gateway, engine, service) = setup();
    let event_id = future_event(&service, 10).await;
    gateway.set_commit_delay(Some(Duration::from_millis(200)));

    let err = engine
        .register(
            event_id,
            "Alice",
            "alice@example.com",
            Some(Duration::from_millis(20)),
        )
        .await
        .unwrap_err();

    assert_eq!(err, RegistryError::Timeout);
    // No partial state may be observable.
    assert!(gateway.user_by_email("alice@example.com").is_none());
    assert_eq!(gateway.registration_count(event_id), 0);

    // The dropped transaction released its row lock.
    gateway.set_commit_delay(None);
    assert!(engine
        .register(event_id, "Alice", "alice@example.com", None)
        .await
        .is_ok());
}

#[tokio::test]
async fn unavailable_store_is_surfaced_as_store_unavailable() {
    let (gateway, engine, service) = setup();
    let event_id = future_event(&service, 10).await;
    gateway.set_unavailable(true);

    let err = engine
        .register(event_id, "Alice", "alice@example.com", None)
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::StoreUnavailable(_)));
}

#[tokio::test]
async fn blank_inputs_fail_validation_before_any_transaction() {
    let (gateway, engine, service) = setup();
    let event_id = future_event(&service, 10).await;
    gateway.set_unavailable(true); // would fail if a transaction opened

    let err = engine
        .register(event_id, "", "alice@example.com", None)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation { field: "name", .. }));

    let err = engine
        .register(event_id, "Alice", "not-an-email", None)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation { field: "email", .. }));
}
