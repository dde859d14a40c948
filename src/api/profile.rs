//! Profile pages

use axum::{Router, extract::Path, middleware, response::Html, routing::get};

use super::pages;
use crate::AppState;
use crate::auth::{CurrentUser, require_auth};
use crate::error::AppError;

/// Create profile router
///
/// Routes:
/// - GET /user/:username - Profile of the logged-in user
///
/// All routes sit behind `require_auth`.
pub fn profile_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/user/:username", get(user_page))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// GET /user/:username
///
/// Only the owner may view a profile. Anyone else who is logged in
/// gets a 403 page rather than a login redirect.
async fn user_page(
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<Html<String>, AppError> {
    if user.username != username {
        tracing::warn!(
            user = %user.username,
            requested = %username,
            "Profile access denied"
        );
        return Err(AppError::Forbidden { username });
    }

    Ok(Html(pages::profile_page(&user.username)))
}
