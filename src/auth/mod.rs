//! Username/password authentication
//!
//! Handles:
//! - Login/logout flow
//! - Session management
//! - Authentication middleware
//! - Password hashing

mod login;
mod middleware;
pub mod password;
pub mod session;

pub use login::auth_router;
pub use middleware::{CurrentUser, MaybeUser, require_auth};
pub use session::{SESSION_COOKIE, SessionStore, generate_session_token};
