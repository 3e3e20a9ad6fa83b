/// Cache-aside profile cache
///
/// Profile reads go to the cache first and fall back to the primary store on a
/// miss or on any cache failure. Writes land in the primary store first; the
/// cache is refreshed afterwards and a failed refresh never fails the request.
///
/// Entries live under `user:{id}` as JSON holding `first_name`, `last_name`
/// and `email`. No expiry is set; an entry stays until the next write for the
/// same user overwrites it.
///
/// # Implementations
///
/// - [`RedisProfileCache`]: Redis with command timeouts and bounded retry
/// - [`InMemoryProfileCache`]: process-local map for tests and local runs
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use tessera_shared::cache::{InMemoryProfileCache, ProfileCache};
/// use tessera_shared::models::user::User;
///
/// # async fn example() -> Result<(), tessera_shared::cache::CacheError> {
/// let cache = InMemoryProfileCache::new();
/// let user = User {
///     id: 7,
///     first_name: "Ada".to_string(),
///     last_name: "Lovelace".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
///
/// cache.write(&user).await?;
/// let snapshot = cache.read(7).await?.unwrap();
/// assert_eq!(snapshot.email, "ada@example.com");
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use thiserror::Error;

use crate::models::user::{User, UserSnapshot};

pub mod client;
pub mod memory;
pub mod redis_cache;

pub use client::{RedisClient, RedisConfig};
pub use memory::InMemoryProfileCache;
pub use redis_cache::RedisProfileCache;

/// Cache errors
///
/// Callers on the request path log these and carry on with the primary store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend unreachable or connection dropped
    #[error("cache connection error: {0}")]
    Connection(String),

    /// Backend rejected the command
    #[error("cache command error: {0}")]
    Command(String),

    /// Command exceeded the configured timeout
    #[error("cache operation '{0}' timed out")]
    Timeout(String),

    /// Entry could not be encoded or decoded
    #[error("cache serialization error: {0}")]
    Serialization(String),

    /// Invalid cache configuration
    #[error("cache configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Whether retrying the same command may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, CacheError::Connection(_) | CacheError::Timeout(_))
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            CacheError::Timeout(err.to_string())
        } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            CacheError::Connection(err.to_string())
        } else {
            CacheError::Command(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

/// Cache key for a user's profile snapshot
pub fn cache_key(user_id: i64) -> String {
    format!("user:{}", user_id)
}

/// Decodes a cached entry, treating undecodable data as a miss
pub(crate) fn decode_snapshot(user_id: i64, raw: &str) -> Option<UserSnapshot> {
    match serde_json::from_str(raw) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Discarding undecodable cache entry");
            None
        }
    }
}

/// Encodes the cached projection of a user
pub(crate) fn encode_snapshot(user: &User) -> Result<String, CacheError> {
    Ok(serde_json::to_string(&UserSnapshot::from(user))?)
}

/// Contract for the profile cache
#[async_trait]
pub trait ProfileCache: Send + Sync {
    /// Looks up the snapshot for `user_id`
    ///
    /// Returns `Ok(None)` on a miss and for entries that fail to decode.
    async fn read(&self, user_id: i64) -> Result<Option<UserSnapshot>, CacheError>;

    /// Stores the snapshot of `user`, overwriting any existing entry
    async fn write(&self, user: &User) -> Result<(), CacheError>;

    /// Checks connectivity
    async fn ping(&self) -> Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key(1), "user:1");
        assert_eq!(cache_key(42), "user:42");
    }

    #[test]
    fn test_transient_errors() {
        assert!(CacheError::Connection("refused".into()).is_transient());
        assert!(CacheError::Timeout("GET".into()).is_transient());
        assert!(!CacheError::Command("WRONGTYPE".into()).is_transient());
        assert!(!CacheError::Serialization("eof".into()).is_transient());
        assert!(!CacheError::Config("bad url".into()).is_transient());
    }

    #[test]
    fn test_decode_snapshot() {
        let raw = r#"{"first_name":"Ada","last_name":"Lovelace","email":"ada@example.com"}"#;
        let snapshot = decode_snapshot(1, raw).unwrap();
        assert_eq!(snapshot.first_name, "Ada");
        assert_eq!(snapshot.last_name, "Lovelace");
        assert_eq!(snapshot.email, "ada@example.com");

        assert!(decode_snapshot(1, "not json").is_none());
        assert!(decode_snapshot(1, r#"{"first_name":"Ada"}"#).is_none());
    }

    #[test]
    fn test_encode_snapshot_has_only_profile_fields() {
        let user = User {
            id: 3,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let raw = encode_snapshot(&user).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 3);
        assert_eq!(object["email"], "ada@example.com");
        assert!(!raw.contains("secret-hash"));
    }
}
