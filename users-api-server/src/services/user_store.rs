//! Persistence boundary for user records.
//!
//! Handlers only see the [`UserStore`] trait; the PostgreSQL implementation
//! issues exactly one parameterized statement per call.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use shared::models::{CreateUserRequest, User};
use sqlx::PgPool;
use thiserror::Error;
use tokio::time::Instant;

/// Failure reaching or querying the database.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("database operation timed out after {0:?}")]
    DeadlineExceeded(Duration),
}

/// Storage operations backing the user endpoints.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user and returns the identifier the database assigned.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any database failure, including constraint
    /// violations.
    async fn create_user(&self, request: &CreateUserRequest) -> Result<i32, StoreError>;

    /// Looks a user up by primary key. `Ok(None)` means no row matched.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any database failure.
    async fn find_user(&self, user_id: i32) -> Result<Option<User>, StoreError>;
}

/// Point in time by which a request's store call must finish.
#[derive(Debug, Clone, Copy)]
pub struct RequestDeadline {
    at: Instant,
    budget: Duration,
}

impl RequestDeadline {
    /// A deadline `budget` from now.
    pub fn starting_now(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }
}

/// Runs a store operation, failing with [`StoreError::DeadlineExceeded`] once
/// the deadline passes. Dropping the returned future drops the operation.
///
/// # Errors
/// Propagates the operation's own error or reports the elapsed deadline.
pub async fn with_deadline<T, F>(deadline: RequestDeadline, operation: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout_at(deadline.at, operation)
        .await
        .map_err(|_| StoreError::DeadlineExceeded(deadline.budget))?
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i32,
    username: String,
    email: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.user_id,
            username: row.username,
            email: row.email,
        }
    }
}

/// [`UserStore`] backed by the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Construct a new store bound to the provided connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, request: &CreateUserRequest) -> Result<i32, StoreError> {
        let user_id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO users (username, email) VALUES ($1, $2) RETURNING user_id",
        )
        .bind(&request.username)
        .bind(&request.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_id)
    }

    async fn find_user(&self, user_id: i32) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, username, email FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_implementations {
    use super::*;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering},
    };
    use tokio::sync::Notify;

    /// In-memory store handing out sequential identifiers from 1.
    #[derive(Default)]
    pub struct InMemoryUserStore {
        users: Mutex<Vec<User>>,
        next_id: AtomicI32,
        writes: AtomicUsize,
    }

    impl InMemoryUserStore {
        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserStore for InMemoryUserStore {
        async fn create_user(&self, request: &CreateUserRequest) -> Result<i32, StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let user_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            self.users.lock().unwrap().push(User {
                user_id,
                username: request.username.clone(),
                email: request.email.clone(),
            });
            Ok(user_id)
        }

        async fn find_user(&self, user_id: i32) -> Result<Option<User>, StoreError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|user| user.user_id == user_id)
                .cloned())
        }
    }

    /// Store whose every call fails the way an unreachable database does.
    pub struct FailingUserStore;

    #[async_trait]
    impl UserStore for FailingUserStore {
        async fn create_user(&self, _request: &CreateUserRequest) -> Result<i32, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn find_user(&self, _user_id: i32) -> Result<Option<User>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    /// Store whose calls never complete; records when a call starts and when
    /// its future is dropped.
    #[derive(Default)]
    pub struct HangingUserStore {
        pub started: Notify,
        pub cancelled: Arc<AtomicBool>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    impl HangingUserStore {
        async fn hang<T>(&self) -> Result<T, StoreError> {
            let _flag = DropFlag(Arc::clone(&self.cancelled));
            self.started.notify_one();
            std::future::pending().await
        }
    }

    #[async_trait]
    impl UserStore for HangingUserStore {
        async fn create_user(&self, _request: &CreateUserRequest) -> Result<i32, StoreError> {
            self.hang().await
        }

        async fn find_user(&self, _user_id: i32) -> Result<Option<User>, StoreError> {
            self.hang().await
        }
    }
}
