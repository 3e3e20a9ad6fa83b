/// Redis-backed profile cache
///
/// Snapshots are stored with a plain `SET` (no expiry) and read with `GET`.

use async_trait::async_trait;

use super::client::RedisClient;
use super::{cache_key, decode_snapshot, encode_snapshot, CacheError, ProfileCache};
use crate::models::user::{User, UserSnapshot};

/// Profile cache over a [`RedisClient`]
#[derive(Debug, Clone)]
pub struct RedisProfileCache {
    client: RedisClient,
}

impl RedisProfileCache {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RedisClient {
        &self.client
    }
}

#[async_trait]
impl ProfileCache for RedisProfileCache {
    async fn read(&self, user_id: i64) -> Result<Option<UserSnapshot>, CacheError> {
        let key = cache_key(user_id);
        let raw: Option<String> = self.client.execute("GET", redis::cmd("GET").arg(&key)).await?;

        Ok(raw.and_then(|raw| decode_snapshot(user_id, &raw)))
    }

    async fn write(&self, user: &User) -> Result<(), CacheError> {
        let key = cache_key(user.id);
        let value = encode_snapshot(user)?;

        let () = self
            .client
            .execute("SET", redis::cmd("SET").arg(&key).arg(value))
            .await?;

        tracing::debug!(user_id = user.id, "Profile cache refreshed");
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.client.ping().await
    }
}
