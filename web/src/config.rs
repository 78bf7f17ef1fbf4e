//! Configuration loaded from environment variables with defaults.

use std::env;
use std::str::FromStr;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,
    /// Deadline applied to every engine call, in seconds.
    pub request_timeout_secs: u64,
    /// Apply pending migrations on startup.
    pub run_migrations: bool,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// development defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            database_url: env_or("DATABASE_URL", "postgres://localhost/gather"),
            host: env_or("SERVER_HOST", "0.0.0.0"),
            port: env_parse("SERVER_PORT", 3000),
            log_level: env_or("LOG_LEVEL", "info"),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 30),
            run_migrations: env_parse("RUN_MIGRATIONS", true),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
