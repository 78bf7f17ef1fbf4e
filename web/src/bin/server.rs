//! Event management HTTP server.

use std::sync::Arc;
use std::time::Duration;

use gather_core::SystemClock;
use gather_postgres::PostgresGateway;
use gather_web::{router, AppState, Config};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("gather={},tower_http=debug", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting event management server");

    let gateway = Arc::new(PostgresGateway::connect(&config.database_url).await?);
    if config.run_migrations {
        gateway.migrate().await?;
    }

    let state = AppState::new(
        gateway,
        Arc::new(SystemClock),
        Some(Duration::from_secs(config.request_timeout_secs)),
    );
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    // Shut down cleanly on ctrl-c; errors here mean the signal handler
    // could not be installed, in which case we simply never resolve.
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
