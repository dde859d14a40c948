//! sessiongate binary entry point

use sessiongate::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing/logging from `[logging]`
/// 3. Validate configuration
/// 4. Initialize AppState
/// 5. Build Axum router
/// 6. Start background session purge
/// 7. Start HTTP server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration
    let config = config::AppConfig::load_unchecked()?;

    // 2. Initialize tracing/logging; RUST_LOG overrides the configured level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.filter_directive().into());

    if config.logging.is_json() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting sessiongate...");

    // 3. Validate configuration
    config.validate()?;
    tracing::info!(
        domain = %config.server.domain,
        protocol = %config.server.protocol,
        users = config.users.len(),
        "Configuration loaded"
    );

    sessiongate::metrics::init_metrics();

    // 4. Initialize application state
    let state = AppState::new(config.clone()).await?;

    // 5. Build Axum router
    let app = sessiongate::build_router(state.clone());

    // 6. Bind listener
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Public URL: {}", config.server.base_url());

    // 7. Start background tasks
    spawn_session_purge_task(state.clone());

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}

/// Spawn background task that deletes expired sessions
fn spawn_session_purge_task(state: AppState) {
    tokio::spawn(async move {
        let interval_secs = state.config.auth.purge_interval_seconds.max(1);
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));

        loop {
            interval.tick().await;

            match state.sessions.purge_expired().await {
                Ok(0) => tracing::debug!("No expired sessions to purge"),
                Ok(purged) => tracing::info!(purged, "Purged expired sessions"),
                Err(error) => tracing::error!(%error, "Session purge failed"),
            }
        }
    });

    tracing::info!("Session purge task spawned");
}
