//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Authentication Metrics
    pub static ref LOGIN_ATTEMPTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("sessiongate_login_attempts_total", "Total number of login attempts"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref SESSIONS_CREATED_TOTAL: IntCounter = IntCounter::new(
        "sessiongate_sessions_created_total",
        "Total number of sessions created"
    ).expect("metric can be created");
    pub static ref SESSIONS_DELETED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("sessiongate_sessions_deleted_total", "Total number of sessions deleted"),
        &["reason"]
    ).expect("metric can be created");

    // Application Metrics
    pub static ref USERS_TOTAL: IntGauge = IntGauge::new(
        "sessiongate_users_total",
        "Total number of seeded users"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("sessiongate_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(LOGIN_ATTEMPTS_TOTAL.clone()))
        .expect("LOGIN_ATTEMPTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SESSIONS_CREATED_TOTAL.clone()))
        .expect("SESSIONS_CREATED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SESSIONS_DELETED_TOTAL.clone()))
        .expect("SESSIONS_DELETED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(USERS_TOTAL.clone()))
        .expect("USERS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}

/// Record a login attempt outcome.
pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    LOGIN_ATTEMPTS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record sessions removed from the store.
pub fn record_sessions_deleted(reason: &str, count: u64) {
    SESSIONS_DELETED_TOTAL
        .with_label_values(&[reason])
        .inc_by(count);
}
