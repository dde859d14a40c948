//! SQLite database operations
//!
//! All database access goes through this module.

use chrono::{DateTime, Utc};
use sqlx::{Pool, QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

use super::models::*;
use crate::error::AppError;

const SESSION_TOKEN_HASH_PREFIX: &str = "sha256:";

/// Digest stored in place of a session token.
pub(crate) fn hash_session_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!(
        "{}{}",
        SESSION_TOKEN_HASH_PREFIX,
        URL_SAFE_NO_PAD.encode(digest)
    )
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        // Foreign keys are enabled by sqlx's SQLite defaults
        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Get user by username (exact match)
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user by ID
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Insert a user or refresh the password hash of an existing one
    ///
    /// The user ID is kept stable across restarts so that existing
    /// sessions stay attached to the same account.
    pub async fn upsert_user(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(username) DO UPDATE SET password_hash = excluded.password_hash
            "#,
        )
        .bind(EntityId::new().0)
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_user_by_username(username).await?.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("user {username} missing after upsert"))
        })
    }

    /// Delete every user whose username is not in `keep`
    ///
    /// Sessions of deleted users go with them (ON DELETE CASCADE).
    pub async fn delete_users_except(&self, keep: &[String]) -> Result<u64, AppError> {
        if keep.is_empty() {
            let result = sqlx::query("DELETE FROM users")
                .execute(&self.pool)
                .await?;
            return Ok(result.rows_affected());
        }

        let mut query_builder =
            QueryBuilder::<Sqlite>::new("DELETE FROM users WHERE username NOT IN (");
        {
            let mut separated = query_builder.separated(", ");
            for username in keep {
                separated.push_bind(username);
            }
        }
        query_builder.push(")");

        let result = query_builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Count users
    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Persist a session for `token`
    ///
    /// Only the token digest is written.
    pub async fn insert_session(
        &self,
        token: &str,
        user_id: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let session = Session {
            id: hash_session_token(token),
            user_id: user_id.to_string(),
            created_at,
            expires_at,
        };

        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(session)
    }

    /// Get session by token
    ///
    /// Expired rows are returned as-is; callers decide what to do with them.
    pub async fn get_session(&self, token: &str) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ?")
            .bind(hash_session_token(token))
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// Delete session by token
    ///
    /// Returns whether a row was removed.
    pub async fn delete_session(&self, token: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(hash_session_token(token))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete session by its stored ID (token digest)
    pub async fn delete_session_by_id(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete all sessions whose expiry has passed
    pub async fn delete_expired_sessions(&self) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE julianday(expires_at) <= julianday('now')")
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    /// Count sessions belonging to a user
    #[cfg(test)]
    pub async fn count_sessions_for_user(&self, user_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
