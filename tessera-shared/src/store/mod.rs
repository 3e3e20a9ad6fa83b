/// Primary user store
///
/// The HTTP layer never talks to the database directly; it consumes the
/// [`UserStore`] trait. Two implementations are provided:
///
/// - [`PgUserStore`]: PostgreSQL via sqlx, every query bounded by a timeout
/// - [`InMemoryUserStore`]: process-local map for tests and local runs
///
/// Each operation is a single atomic statement. Concurrent updates to the same
/// row are not serialized here; the last write wins.
///
/// # Example
///
/// ```
/// use tessera_shared::models::user::CreateUser;
/// use tessera_shared::store::{InMemoryUserStore, UserStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryUserStore::new();
/// let user = store
///     .create(CreateUser {
///         first_name: "Ada".to_string(),
///         last_name: "Lovelace".to_string(),
///         email: "ada@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     })
///     .await?;
///
/// assert_eq!(store.find_by_email("ada@example.com").await?, Some(user));
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;

use crate::models::user::{CreateUser, UpdateUser, User};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

/// User store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Email belongs to another account
    #[error("email already exists")]
    EmailTaken,

    /// Query exceeded the configured timeout
    #[error("store operation '{0}' timed out")]
    Timeout(&'static str),

    /// Any other database failure
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.constraint().is_some_and(|c| c.contains("email")) {
                return StoreError::EmailTaken;
            }
        }
        StoreError::Database(err.to_string())
    }
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Contract for the primary user store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by ID
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// Finds a user by exact email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Inserts a new user
    ///
    /// Fails with `StoreError::EmailTaken` if the email is registered.
    async fn create(&self, data: CreateUser) -> StoreResult<User>;

    /// Applies the `Some` fields of `data` to user `id`
    ///
    /// Returns `None` if the user no longer exists. Fails with
    /// `StoreError::EmailTaken` if the new email belongs to another account.
    async fn update(&self, id: i64, data: UpdateUser) -> StoreResult<Option<User>>;

    /// Checks connectivity
    async fn ping(&self) -> StoreResult<()>;
}
