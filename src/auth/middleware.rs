//! Authentication middleware
//!
//! Protects routes that require a logged-in user.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use super::session::SESSION_COOKIE;
use crate::AppState;
use crate::data::User;
use crate::error::AppError;

pub(crate) fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}

/// Resolve a session token to its user
///
/// Unknown, expired, and orphaned sessions are all `Unauthorized`.
pub(crate) async fn authenticate_token(token: &str, state: &AppState) -> Result<User, AppError> {
    let session = state
        .sessions
        .lookup(token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    state
        .db
        .get_user_by_id(&session.user_id)
        .await?
        .ok_or(AppError::Unauthorized)
}

async fn authenticate_headers(headers: &HeaderMap, state: &AppState) -> Result<User, AppError> {
    let token = extract_token_from_headers(headers).ok_or(AppError::Unauthorized)?;
    authenticate_token(&token, state).await
}

/// Middleware to require authentication
///
/// Resolves the `sessionId` cookie to a user and adds the `User`
/// to request extensions. Requests without a valid session are
/// redirected to `/login`.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/user/:username", ...)
///     .route_layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate_headers(request.headers(), &state).await?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Extractor for current authenticated user
///
/// Use in handlers to get the logged-in user.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    /// Extract current user from request
    ///
    /// Reuses the user attached by `require_auth` when present.
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(CurrentUser(user));
        }

        let state = AppState::from_ref(state);
        let user = authenticate_headers(&parts.headers, &state).await?;
        parts.extensions.insert(user.clone());

        Ok(CurrentUser(user))
    }
}

/// Optional current user extractor
///
/// Returns None if not authenticated, instead of redirecting.
/// Storage failures still surface as errors.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(MaybeUser(Some(user)));
        }

        let app_state = AppState::from_ref(state);
        let user = match authenticate_headers(&parts.headers, &app_state).await {
            Ok(user) => Some(user),
            Err(AppError::Unauthorized) => None,
            Err(error) => return Err(error),
        };

        if let Some(user) = &user {
            parts.extensions.insert(user.clone());
        }

        Ok(MaybeUser(user))
    }
}
