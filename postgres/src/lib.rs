//! `PostgreSQL` store gateway for the gather registration core.
//!
//! Implements the `StoreGateway` contract over a `sqlx` connection
//! pool. Transactions run at `PostgreSQL`'s default read-committed
//! isolation; the registration engine's row lock maps to
//! `SELECT … FOR UPDATE`, which serializes concurrent registration
//! attempts against the same event row until the holder commits or
//! rolls back.
//!
//! # Example
//!
//! ```no_run
//! use gather_postgres::PostgresGateway;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = PostgresGateway::connect("postgresql://localhost/gather").await?;
//! gateway.migrate().await?;
//! # Ok(())
//! # }
//! ```

mod gateway;

pub use gateway::PostgresGateway;
