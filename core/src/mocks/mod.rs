//! Mock implementations for testing.
//!
//! Enabled through the default-on `test-utils` feature so downstream
//! crates can drive the engine at memory speed.

pub mod clock;
pub mod gateway;

pub use clock::FixedClock;
pub use gateway::MockGateway;
