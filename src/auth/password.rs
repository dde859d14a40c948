//! Password hashing with Argon2

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::AppError;

/// Well-formed hash that no password matches
///
/// Verified against when the username is unknown so both paths cost
/// one Argon2 run. Parameters match `Argon2::default()`.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash a password with a fresh random salt
///
/// # Returns
/// PHC-formatted hash string
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// Verify a password against a stored PHC hash
///
/// A mismatch is `Ok(false)`; only a malformed hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| AppError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Check credentials on the blocking pool
///
/// `hash` is `None` for an unknown user; the dummy hash is verified
/// instead and the result is always `false`.
pub async fn verify_credentials(password: String, hash: Option<String>) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || {
        let matched = verify_password(&password, hash.as_deref().unwrap_or(DUMMY_PASSWORD_HASH))?;
        Ok::<bool, AppError>(matched && hash.is_some())
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?
}
