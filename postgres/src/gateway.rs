//! `StoreGateway` implementation over a `sqlx` Postgres pool.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use gather_core::error::{RegistryError, Result};
use gather_core::gateway::StoreGateway;
use gather_core::types::{Event, EventId, User, UserId};

/// `PostgreSQL` store gateway.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct PostgresGateway {
    pool: PgPool,
}

impl PostgresGateway {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the given database URL.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the database cannot be reached.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .connect(url)
            .await
            .map_err(|e| RegistryError::StoreUnavailable(e.to_string()))?;
        tracing::info!("connected to postgres");
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RegistryError::Internal(format!("migration failed: {e}")))?;
        tracing::info!("migrations applied");
        Ok(())
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    date_time: DateTime<Utc>,
    location: String,
    capacity: i32,
}

impl EventRow {
    fn into_event(self) -> Result<Event> {
        Ok(Event {
            id: EventId(self.id),
            title: self.title,
            date_time: self.date_time,
            location: self.location,
            capacity: u32::try_from(self.capacity)
                .map_err(|_| RegistryError::Internal("negative capacity in store".to_owned()))?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId(row.id),
            name: row.name,
            email: row.email,
        }
    }
}

/// Classify a query failure: connection-level trouble is transient
/// (`StoreUnavailable`), everything else unexpected is `Internal`.
fn map_query_err(err: sqlx::Error) -> RegistryError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RegistryError::StoreUnavailable(err.to_string())
        }
        other => RegistryError::Internal(other.to_string()),
    }
}

/// Like [`map_query_err`] but surfaces a unique-constraint violation
/// as the supplied domain error.
fn map_insert_err(err: sqlx::Error, on_unique_violation: RegistryError) -> RegistryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return on_unique_violation;
        }
    }
    map_query_err(err)
}

fn count_to_u32(count: i64) -> Result<u32> {
    u32::try_from(count)
        .map_err(|_| RegistryError::Internal("negative registration count".to_owned()))
}

impl StoreGateway for PostgresGateway {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx> {
        // Read committed is the Postgres default, which is all the
        // engine requires alongside the explicit row lock.
        self.pool.begin().await.map_err(map_query_err)
    }

    async fn commit(&self, tx: Self::Tx) -> Result<()> {
        tx.commit()
            .await
            .map_err(|e| map_insert_err(e, RegistryError::Conflict))
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<()> {
        tx.rollback().await.map_err(map_query_err)
    }

    async fn lock_event_for_update(&self, tx: &mut Self::Tx, id: EventId) -> Result<Option<Event>> {
        let row: Option<EventRow> = sqlx::query_as(
            r"
            SELECT id, title, date_time, location, capacity
            FROM events
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id.0)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_query_err)?;
        row.map(EventRow::into_event).transpose()
    }

    async fn find_user_by_email(&self, tx: &mut Self::Tx, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT id, name, email
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_query_err)?;
        Ok(row.map(User::from))
    }

    async fn create_user(&self, tx: &mut Self::Tx, name: &str, email: &str) -> Result<User> {
        let user = User {
            id: UserId::new(),
            name: name.to_owned(),
            email: email.to_owned(),
        };
        sqlx::query(
            r"
            INSERT INTO users (id, name, email)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(user.id.0)
        .bind(&user.name)
        .bind(&user.email)
        .execute(&mut **tx)
        .await
        // Concurrent first-time registration with the same email; the
        // engine owns the retry policy.
        .map_err(|e| map_insert_err(e, RegistryError::Conflict))?;
        Ok(user)
    }

    async fn registration_exists(
        &self,
        tx: &mut Self::Tx,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<bool> {
        sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM registrations
                WHERE user_id = $1 AND event_id = $2
            )
            ",
        )
        .bind(user_id.0)
        .bind(event_id.0)
        .fetch_one(&mut **tx)
        .await
        .map_err(map_query_err)
    }

    async fn count_registrations_in_tx(&self, tx: &mut Self::Tx, event_id: EventId) -> Result<u32> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM registrations WHERE event_id = $1
            ",
        )
        .bind(event_id.0)
        .fetch_one(&mut **tx)
        .await
        .map_err(map_query_err)?;
        count_to_u32(count)
    }

    async fn insert_registration(
        &self,
        tx: &mut Self::Tx,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO registrations (user_id, event_id)
            VALUES ($1, $2)
            ",
        )
        .bind(user_id.0)
        .bind(event_id.0)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_insert_err(e, RegistryError::DuplicateRegistration))?;
        Ok(())
    }

    async fn delete_registration(&self, event_id: EventId, user_id: UserId) -> Result<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM registrations
            WHERE event_id = $1 AND user_id = $2
            ",
        )
        .bind(event_id.0)
        .bind(user_id.0)
        .execute(&self.pool)
        .await
        .map_err(map_query_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_event(&self, event: &Event) -> Result<()> {
        let capacity = i32::try_from(event.capacity)
            .map_err(|_| RegistryError::Internal("capacity out of range".to_owned()))?;
        sqlx::query(
            r"
            INSERT INTO events (id, title, date_time, location, capacity)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(event.id.0)
        .bind(&event.title)
        .bind(event.date_time)
        .bind(&event.location)
        .bind(capacity)
        .execute(&self.pool)
        .await
        .map_err(map_query_err)?;
        Ok(())
    }

    async fn find_event(&self, id: EventId) -> Result<Option<Event>> {
        let row: Option<EventRow> = sqlx::query_as(
            r"
            SELECT id, title, date_time, location, capacity
            FROM events
            WHERE id = $1
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_query_err)?;
        row.map(EventRow::into_event).transpose()
    }

    async fn list_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r"
            SELECT id, title, date_time, location, capacity
            FROM events
            WHERE date_time > $1
            ORDER BY date_time ASC, location ASC
            ",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(map_query_err)?;
        rows.into_iter().map(EventRow::into_event).collect()
    }

    async fn list_attendees(&self, event_id: EventId) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r"
            SELECT u.id, u.name, u.email
            FROM users u
            INNER JOIN registrations r ON u.id = r.user_id
            WHERE r.event_id = $1
            ORDER BY u.email ASC
            ",
        )
        .bind(event_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_query_err)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn count_registrations(&self, event_id: EventId) -> Result<u32> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM registrations WHERE event_id = $1
            ",
        )
        .bind(event_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_query_err)?;
        count_to_u32(count)
    }
}
