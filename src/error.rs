//! Error types for sessiongate
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use thiserror::Error;

use crate::api::pages;

/// Application-wide error type
///
/// Authentication failures are soft: a missing or unknown session
/// sends the browser back to the login page instead of an error body.
#[derive(Debug, Error)]
pub enum AppError {
    /// No valid session (redirect to /login)
    #[error("Authentication required")]
    Unauthorized,

    /// Wrong username or password (401)
    #[error("Invalid credentials for {username}")]
    InvalidCredentials { username: String },

    /// Authenticated, but not as the requested user (403)
    #[error("Access denied to profile of {username}")]
    Forbidden { username: String },

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing error (500)
    #[error("Password hash error: {0}")]
    PasswordHash(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidCredentials { .. } => "invalid_credentials",
            AppError::Forbidden { .. } => "forbidden",
            AppError::Database(_) => "database",
            AppError::PasswordHash(_) => "password_hash",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to a redirect or a rendered error page.
    fn into_response(self) -> Response {
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[self.error_type()]).inc();

        let (status, page) = match &self {
            AppError::Unauthorized => return Redirect::to("/login").into_response(),
            AppError::InvalidCredentials { username } => {
                let message = if username.is_empty() {
                    "Invalid username or password.".to_string()
                } else {
                    format!("Invalid username or password for {}.", username)
                };
                (
                    StatusCode::UNAUTHORIZED,
                    pages::error_page("Login failed", &message),
                )
            }
            AppError::Forbidden { username } => (
                StatusCode::FORBIDDEN,
                pages::error_page(
                    "Access denied",
                    &format!("You are not allowed to view the profile of {}.", username),
                ),
            ),
            AppError::Database(_)
            | AppError::PasswordHash(_)
            | AppError::Config(_)
            | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    pages::error_page("Server error", "Something went wrong. Please try again."),
                )
            }
        };

        (status, page).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
