/// PostgreSQL-backed user store
///
/// Every query is wrapped in `tokio::time::timeout` so a stalled connection
/// surfaces as `StoreError::Timeout` instead of hanging the request. The pool
/// itself is created by [`crate::db::pool::create_pool`].

use async_trait::async_trait;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;

use super::{StoreError, StoreResult, UserStore};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Default per-query timeout
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, created_at, updated_at";

/// User store over a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgUserStore {
    /// Creates a store with the default query timeout
    pub fn new(pool: PgPool) -> Self {
        Self::with_timeout(pool, DEFAULT_QUERY_TIMEOUT)
    }

    /// Creates a store with an explicit query timeout
    pub fn with_timeout(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => {
                tracing::warn!(operation, timeout_ms = self.query_timeout.as_millis() as u64, "Store query timed out");
                Err(StoreError::Timeout(operation))
            }
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        self.timed(
            "find_by_id",
            sqlx::query_as::<_, User>(&query).bind(id).fetch_optional(&self.pool),
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        self.timed(
            "find_by_email",
            sqlx::query_as::<_, User>(&query).bind(email).fetch_optional(&self.pool),
        )
        .await
    }

    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        let query = format!(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = self
            .timed(
                "create",
                sqlx::query_as::<_, User>(&query)
                    .bind(data.first_name)
                    .bind(data.last_name)
                    .bind(data.email)
                    .bind(data.password_hash)
                    .fetch_one(&self.pool),
            )
            .await?;

        tracing::info!(user_id = user.id, "User created");
        Ok(user)
    }

    async fn update(&self, id: i64, data: UpdateUser) -> StoreResult<Option<User>> {
        let query = format!(
            r#"
            UPDATE users
            SET first_name    = COALESCE($2, first_name),
                last_name     = COALESCE($3, last_name),
                email         = COALESCE($4, email),
                password_hash = COALESCE($5, password_hash),
                updated_at    = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        self.timed(
            "update",
            sqlx::query_as::<_, User>(&query)
                .bind(id)
                .bind(data.first_name)
                .bind(data.last_name)
                .bind(data.email)
                .bind(data.password_hash)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.timed("ping", crate::db::pool::health_check(&self.pool)).await
    }
}
