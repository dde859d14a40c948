//! Database tests

use super::database::hash_session_token;
use super::*;
use crate::error::AppError;
use chrono::{Duration, Utc};
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
    // Connection successful if we get here without panicking
}

#[tokio::test]
async fn test_connect_creates_parent_directory() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("dir").join("test.db");

    let db = Database::connect(&db_path).await.unwrap();
    assert_eq!(db.count_users().await.unwrap(), 0);
    assert!(db_path.exists());
}

#[tokio::test]
async fn test_user_upsert_and_get() {
    let (db, _temp_dir) = create_test_db().await;

    let user = db.upsert_user("alice", "hash-1").await.unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.password_hash, "hash-1");

    let by_name = db.get_user_by_username("alice").await.unwrap().unwrap();
    assert_eq!(by_name.id, user.id);

    let by_id = db.get_user_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(by_id.username, "alice");

    assert!(db.get_user_by_username("Alice").await.unwrap().is_none());
    assert!(db.get_user_by_id("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_user_upsert_keeps_id_and_refreshes_hash() {
    let (db, _temp_dir) = create_test_db().await;

    let first = db.upsert_user("alice", "hash-1").await.unwrap();
    let second = db.upsert_user("alice", "hash-2").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.password_hash, "hash-2");
    assert_eq!(db.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_users_except_cascades_sessions() {
    let (db, _temp_dir) = create_test_db().await;

    let alice = db.upsert_user("alice", "hash").await.unwrap();
    let bob = db.upsert_user("bob", "hash").await.unwrap();
    let now = Utc::now();
    db.insert_session("alice-token", &alice.id, now, now + Duration::hours(1))
        .await
        .unwrap();
    db.insert_session("bob-token", &bob.id, now, now + Duration::hours(1))
        .await
        .unwrap();

    let removed = db
        .delete_users_except(&["alice".to_string()])
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(db.get_user_by_username("bob").await.unwrap().is_none());
    assert!(db.get_session("bob-token").await.unwrap().is_none());
    assert!(db.get_session("alice-token").await.unwrap().is_some());

    let removed = db.delete_users_except(&[]).await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(db.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_session_crud() {
    let (db, _temp_dir) = create_test_db().await;
    let user = db.upsert_user("alice", "hash").await.unwrap();
    let now = Utc::now();

    let session = db
        .insert_session("token-1", &user.id, now, now + Duration::hours(1))
        .await
        .unwrap();
    assert_ne!(session.id, "token-1");
    assert!(session.id.starts_with("sha256:"));

    let retrieved = db.get_session("token-1").await.unwrap().unwrap();
    assert_eq!(retrieved.id, session.id);
    assert_eq!(retrieved.user_id, user.id);
    assert_eq!(db.count_sessions_for_user(&user.id).await.unwrap(), 1);

    assert!(db.delete_session("token-1").await.unwrap());
    assert!(db.get_session("token-1").await.unwrap().is_none());

    // Deleting again is not an error
    assert!(!db.delete_session("token-1").await.unwrap());
}

#[tokio::test]
async fn test_session_requires_existing_user() {
    let (db, _temp_dir) = create_test_db().await;
    let now = Utc::now();

    let result = db
        .insert_session("token", "no-such-user", now, now + Duration::hours(1))
        .await;
    assert!(matches!(result, Err(AppError::Database(_))));
}

#[tokio::test]
async fn test_delete_expired_sessions() {
    let (db, _temp_dir) = create_test_db().await;
    let user = db.upsert_user("alice", "hash").await.unwrap();
    let now = Utc::now();

    db.insert_session(
        "stale",
        &user.id,
        now - Duration::hours(2),
        now - Duration::hours(1),
    )
    .await
    .unwrap();
    db.insert_session("fresh", &user.id, now, now + Duration::hours(1))
        .await
        .unwrap();

    let purged = db.delete_expired_sessions().await.unwrap();
    assert_eq!(purged, 1);
    assert!(db.get_session("stale").await.unwrap().is_none());
    assert!(db.get_session("fresh").await.unwrap().is_some());
}

#[test]
fn test_hash_session_token_is_stable() {
    assert_eq!(hash_session_token("abc"), hash_session_token("abc"));
    assert_ne!(hash_session_token("abc"), hash_session_token("abd"));
}
