//! Session management
//!
//! Opaque random tokens stored server-side. The cookie carries the
//! token; the database keeps only its digest.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::data::{Database, Session};
use crate::error::AppError;

/// Cookie that carries the session token
pub const SESSION_COOKIE: &str = "sessionId";

const SESSION_TOKEN_BYTES: usize = 32;

/// Generate a random session token
///
/// 32 bytes from the OS RNG, URL-safe base64 without padding.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Server-side session store
///
/// Safe to share across requests; SQLite serializes the writes.
pub struct SessionStore {
    db: Arc<Database>,
    max_age: Duration,
}

impl SessionStore {
    /// Create a store whose sessions live for `max_age_seconds`
    pub fn new(db: Arc<Database>, max_age_seconds: i64) -> Self {
        Self {
            db,
            max_age: Duration::seconds(max_age_seconds),
        }
    }

    /// Start a session for `user_id`
    ///
    /// # Returns
    /// The token to hand to the client
    pub async fn create(&self, user_id: &str) -> Result<String, AppError> {
        let token = generate_session_token();
        let now = Utc::now();
        self.db
            .insert_session(&token, user_id, now, now + self.max_age)
            .await?;

        crate::metrics::SESSIONS_CREATED_TOTAL.inc();
        tracing::debug!(user_id = %user_id, "Session created");

        Ok(token)
    }

    /// Resolve a token to its session
    ///
    /// Unknown and expired tokens both yield `None`. Expired rows
    /// are removed on the way out.
    pub async fn lookup(&self, token: &str) -> Result<Option<Session>, AppError> {
        let Some(session) = self.db.get_session(token).await? else {
            return Ok(None);
        };

        if session.is_expired() {
            if self.db.delete_session_by_id(&session.id).await? {
                crate::metrics::record_sessions_deleted("expired", 1);
            }
            tracing::debug!(user_id = %session.user_id, "Expired session rejected");
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// End the session for `token`
    ///
    /// Deleting an unknown token is not an error.
    pub async fn delete(&self, token: &str) -> Result<(), AppError> {
        self.delete_with_reason(token, "logout").await
    }

    pub(crate) async fn delete_with_reason(
        &self,
        token: &str,
        reason: &str,
    ) -> Result<(), AppError> {
        if self.db.delete_session(token).await? {
            crate::metrics::record_sessions_deleted(reason, 1);
        }
        Ok(())
    }

    /// Remove every expired session
    ///
    /// # Returns
    /// Number of sessions removed
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        let purged = self.db.delete_expired_sessions().await?;
        if purged > 0 {
            crate::metrics::record_sessions_deleted("expired", purged);
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    async fn create_store(max_age_seconds: i64) -> (SessionStore, Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            Database::connect(&temp_dir.path().join("sessions.db"))
                .await
                .unwrap(),
        );
        (SessionStore::new(db.clone(), max_age_seconds), db, temp_dir)
    }

    #[test]
    fn tokens_are_url_safe_and_unique() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate_session_token()).collect();

        assert_eq!(tokens.len(), 1000);
        for token in &tokens {
            assert_eq!(token.len(), 43);
            assert!(
                token
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            );
        }
    }

    #[tokio::test]
    async fn create_lookup_delete() {
        let (store, db, _temp_dir) = create_store(3600).await;
        let user = db.upsert_user("alice", "hash").await.unwrap();

        let token = store.create(&user.id).await.unwrap();
        let session = store.lookup(&token).await.unwrap().expect("session exists");
        assert_eq!(session.user_id, user.id);
        assert!(session.expires_at > session.created_at);

        store.delete(&token).await.unwrap();
        assert!(store.lookup(&token).await.unwrap().is_none());

        // Idempotent
        store.delete(&token).await.unwrap();
    }

    #[tokio::test]
    async fn lookup_of_unknown_token_is_none() {
        let (store, _db, _temp_dir) = create_store(3600).await;

        assert!(store.lookup("never-issued").await.unwrap().is_none());
        assert!(store.lookup("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_session_is_rejected_and_removed() {
        let (store, db, _temp_dir) = create_store(3600).await;
        let user = db.upsert_user("alice", "hash").await.unwrap();
        let now = Utc::now();
        db.insert_session(
            "old-token",
            &user.id,
            now - Duration::hours(2),
            now - Duration::seconds(1),
        )
        .await
        .unwrap();

        assert!(store.lookup("old-token").await.unwrap().is_none());
        assert!(db.get_session("old-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purge_expired_leaves_live_sessions() {
        let (store, db, _temp_dir) = create_store(3600).await;
        let user = db.upsert_user("alice", "hash").await.unwrap();
        let now = Utc::now();
        db.insert_session(
            "old-token",
            &user.id,
            now - Duration::hours(2),
            now - Duration::hours(1),
        )
        .await
        .unwrap();
        let live = store.create(&user.id).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert!(store.lookup(&live).await.unwrap().is_some());
        assert_eq!(store.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn repeated_creates_never_collide() {
        let (store, db, _temp_dir) = create_store(3600).await;
        let user = db.upsert_user("alice", "hash").await.unwrap();

        let mut tokens = HashSet::new();
        for _ in 0..50 {
            assert!(tokens.insert(store.create(&user.id).await.unwrap()));
        }
        assert_eq!(db.count_sessions_for_user(&user.id).await.unwrap(), 50);
    }
}
