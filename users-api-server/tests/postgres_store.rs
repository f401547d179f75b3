//! Round trips through a real PostgreSQL instance.
//!
//! Skipped unless `USERS_API_TEST_DATABASE_URL` points at a database the test
//! may write to. The `users` table is created if it does not exist.

use std::{collections::HashSet, sync::Arc};

use shared::models::CreateUserRequest;
use sqlx::{PgPool, postgres::PgPoolOptions};
use users_api_server::services::user_store::{PgUserStore, UserStore};

const DATABASE_URL_VAR: &str = "USERS_API_TEST_DATABASE_URL";

async fn test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
        eprintln!("{DATABASE_URL_VAR} not set; skipping PostgreSQL test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("connect to test database");
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            user_id SERIAL PRIMARY KEY,
            username TEXT NOT NULL,
            email TEXT NOT NULL
        )",
    )
    .execute(&pool)
    .await
    .expect("create users table");

    Some(pool)
}

fn request(username: &str, email: &str) -> CreateUserRequest {
    CreateUserRequest {
        username: username.to_string(),
        email: email.to_string(),
    }
}

#[tokio::test]
async fn created_users_can_be_read_back() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgUserStore::new(pool);

    let user_id = store
        .create_user(&request("alice", "alice@example.com"))
        .await
        .unwrap();
    assert!(user_id > 0);

    let user = store.find_user(user_id).await.unwrap().unwrap();
    assert_eq!(user.user_id, user_id);
    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");
}

#[tokio::test]
async fn missing_rows_are_none() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgUserStore::new(pool);

    assert!(store.find_user(i32::MAX).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_inserts_get_distinct_ids() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = Arc::new(PgUserStore::new(pool));
    let mut tasks = tokio::task::JoinSet::new();

    for n in 0..16 {
        let store = Arc::clone(&store);
        tasks.spawn(async move {
            store
                .create_user(&request(&format!("user{n}"), &format!("user{n}@example.com")))
                .await
                .unwrap()
        });
    }

    let mut ids = HashSet::new();
    while let Some(result) = tasks.join_next().await {
        assert!(ids.insert(result.unwrap()));
    }
    assert_eq!(ids.len(), 16);
}
