//! sessiongate - a small session-cookie login and profile server
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Layer (Axum)                       │
//! │  - Login / logout                                           │
//! │  - Profile pages (behind require_auth)                      │
//! │  - Health and metrics                                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Auth Layer                             │
//! │  - Session store (opaque tokens, server-side expiry)        │
//! │  - Request gate (middleware + extractors)                   │
//! │  - Argon2 password hashes                                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: profile, metrics and HTML pages
//! - `auth`: login flow, sessions, middleware
//! - `data`: database layer
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned for each request; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Session store
    pub sessions: Arc<auth::SessionStore>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs migrations)
    /// 2. Seed configured users
    /// 3. Build the session store
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = Arc::new(data::Database::connect(&config.database.path).await?);
        tracing::info!("Database connected");

        Self::seed_users(&db, &config.users).await?;

        let sessions = Arc::new(auth::SessionStore::new(
            db.clone(),
            config.auth.session_max_age,
        ));

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            db,
            sessions,
        })
    }

    /// Make the user table match the configured seed set
    ///
    /// Configured users are inserted or get a freshly salted hash.
    /// Users no longer configured are removed along with their sessions.
    async fn seed_users(
        db: &data::Database,
        users: &[config::SeedUser],
    ) -> Result<(), error::AppError> {
        for seed in users {
            let password_hash = auth::password::hash_password(&seed.password)?;
            let user = db.upsert_user(&seed.username, &password_hash).await?;
            tracing::info!(username = %user.username, user_id = %user.id, "Seed user ready");
        }

        let usernames: Vec<String> = users.iter().map(|seed| seed.username.clone()).collect();
        let removed = db.delete_users_except(&usernames).await?;
        if removed > 0 {
            tracing::info!(removed, "Removed users no longer in configuration");
        }

        let total = db.count_users().await?;
        metrics::USERS_TOTAL.set(total);

        Ok(())
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use std::time::Duration;
    use tower_http::{
        compression::CompressionLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer,
        trace::TraceLayer,
    };

    const MAX_BODY_BYTES: usize = 16 * 1024;

    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router())
        .merge(api::profile_router(state.clone()))
        .merge(api::metrics_router(state.clone()))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
