//! Login and logout flow
//!
//! Form-based username/password login backed by the session store.

use axum::{
    Form, Router,
    extract::{State, rejection::FormRejection},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;

use super::middleware::MaybeUser;
use super::password::verify_credentials;
use super::session::SESSION_COOKIE;
use crate::AppState;
use crate::api::pages;
use crate::error::AppError;

/// Create authentication router
///
/// Routes:
/// - GET / - Redirect to login
/// - GET /login - Login page
/// - POST /login - Credential check
/// - POST /logout - Logout
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

/// Path of a user's profile page
pub(crate) fn profile_path(username: &str) -> String {
    format!("/user/{}", urlencoding::encode(username))
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

// =============================================================================
// Pages
// =============================================================================

/// GET /
async fn root() -> Redirect {
    Redirect::to("/login")
}

/// GET /login
///
/// Renders the login form, or sends an already logged-in user
/// to their profile.
async fn login_page(MaybeUser(user): MaybeUser) -> Response {
    match user {
        Some(user) => Redirect::to(&profile_path(&user.username)).into_response(),
        None => Html(pages::login_page()).into_response(),
    }
}

// =============================================================================
// Login
// =============================================================================

/// Login form fields
///
/// Missing fields are treated as empty, which never matches a user.
/// Bodies that fail to deserialize are rejected as bad credentials.
#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// POST /login
///
/// # Steps
/// 1. Look up the user and verify the password
/// 2. Drop any session the browser already carries
/// 3. Create a session and set the cookie
/// 4. Redirect to the profile page
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(
            FormRejection::FailedToDeserializeForm(_)
            | FormRejection::FailedToDeserializeFormBody(_),
        ) => {
            crate::metrics::record_login(false);
            tracing::warn!("Login failed: malformed form body");
            return Err(AppError::InvalidCredentials {
                username: String::new(),
            });
        }
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let user = state.db.get_user_by_username(&form.username).await?;
    let hash = user.as_ref().map(|user| user.password_hash.clone());
    let verified = verify_credentials(form.password, hash).await?;
    let user = match user {
        Some(user) if verified => user,
        _ => {
            crate::metrics::record_login(false);
            tracing::warn!(username = %form.username, "Login failed");
            return Err(AppError::InvalidCredentials {
                username: form.username,
            });
        }
    };

    if let Some(previous) = jar.get(SESSION_COOKIE) {
        state
            .sessions
            .delete_with_reason(previous.value(), "rotated")
            .await?;
    }

    let token = state.sessions.create(&user.id).await?;
    crate::metrics::record_login(true);
    tracing::info!(username = %user.username, "Login succeeded");

    let jar = jar.add(session_cookie(
        token,
        state.config.should_use_secure_cookies(),
    ));

    Ok((jar, Redirect::to(&profile_path(&user.username))).into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// POST /logout
///
/// Deletes the session, clears the cookie and redirects to login.
async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned());

    let jar = match token {
        Some(token) => {
            state.sessions.delete(&token).await?;
            tracing::info!("Logged out");
            jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
        }
        None => jar,
    };

    Ok((jar, Redirect::to("/login")))
}
