//! Concurrency properties of the registration engine.
//!
//! The mock gateway takes a real per-event async lock in
//! `lock_event_for_update`, so these tests exercise the same
//! serialization the Postgres `SELECT … FOR UPDATE` provides.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use gather_core::mocks::{FixedClock, MockGateway};
use gather_core::{EventService, RegistrationEngine, RegistryError};

const NOW_SECS: i64 = 1_700_000_000;

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

fn event_time() -> DateTime<Utc> {
    DateTime::from_timestamp(NOW_SECS, 0).unwrap() + chrono::Duration::days(1)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn capacity_is_never_exceeded_under_concurrent_registrations() {
    const CAPACITY: u32 = 5;
    const ATTEMPTS: usize = 8;

    let (gateway, engine, service) = setup();
    let event_id = service
        .create("Popular", event_time(), "Berlin", CAPACITY)
        .await
        .unwrap();

    let tasks = (0..ATTEMPTS).map(|i| {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .register(event_id, "Racer", &format!("racer{i}@example.com"), None)
                .await
        })
    });
    let outcomes: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let succeeded = outcomes.iter().filter(|r| r.is_ok()).count();
    let full = outcomes
        .iter()
        .filter(|r| matches!(r, Err(RegistryError::EventFull)))
        .count();

    assert_eq!(succeeded, CAPACITY as usize);
    assert_eq!(full, ATTEMPTS - CAPACITY as usize);
    assert_eq!(gateway.registration_count(event_id), CAPACITY as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_same_email_attempts_yield_one_registration() {
    let (gateway, engine, service) = setup();
    let event_id = service
        .create("Meetup", event_time(), "Berlin", 10)
        .await
        .unwrap();

    let tasks = (0..2).map(|_| {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .register(event_id, "Alice", "alice@example.com", None)
                .await
        })
    });
    let outcomes: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    // The event row lock serializes the two transactions, so the loser
    // sees the committed registration rather than a constraint race.
    let succeeded = outcomes.iter().filter(|r| r.is_ok()).count();
    let duplicates = outcomes
        .iter()
        .filter(|r| matches!(r, Err(RegistryError::DuplicateRegistration)))
        .count();

    assert_eq!(succeeded, 1);
    assert_eq!(duplicates, 1);
    assert_eq!(gateway.registration_count(event_id), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn registrations_for_different_events_do_not_serialize_each_other() {
    let (gateway, engine, service) = setup();
    let first = service
        .create("First", event_time(), "Berlin", 100)
        .await
        .unwrap();
    let second = service
        .create("Second", event_time(), "Paris", 100)
        .await
        .unwrap();

    let tasks = (0..20).map(|i| {
        let engine = engine.clone();
        let target = if i % 2 == 0 { first } else { second };
        tokio::spawn(async move {
            engine
                .register(target, "Racer", &format!("racer{i}@example.com"), None)
                .await
        })
    });
    for outcome in join_all(tasks).await {
        outcome.unwrap().unwrap();
    }

    assert_eq!(gateway.registration_count(first), 10);
    assert_eq!(gateway.registration_count(second), 10);
}
