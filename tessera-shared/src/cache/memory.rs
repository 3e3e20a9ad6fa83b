/// In-memory profile cache
///
/// Stores the same JSON encoding as the Redis cache so undecodable entries
/// can be exercised. [`InMemoryProfileCache::set_unavailable`] makes every
/// call fail with `CacheError::Connection`, simulating a backend outage.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{cache_key, decode_snapshot, encode_snapshot, CacheError, ProfileCache};
use crate::models::user::{User, UserSnapshot};

/// Process-local profile cache
#[derive(Debug, Default)]
pub struct InMemoryProfileCache {
    entries: RwLock<HashMap<String, String>>,
    unavailable: AtomicBool,
}

impl InMemoryProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles the simulated outage
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Stores `raw` verbatim under the key for `user_id`
    pub async fn insert_raw(&self, user_id: i64, raw: impl Into<String>) {
        self.entries.write().await.insert(cache_key(user_id), raw.into());
    }

    /// Raw stored value for `user_id`
    pub async fn raw(&self, user_id: i64) -> Option<String> {
        self.entries.read().await.get(&cache_key(user_id)).cloned()
    }

    /// Number of cached entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(CacheError::Connection("cache backend unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProfileCache for InMemoryProfileCache {
    async fn read(&self, user_id: i64) -> Result<Option<UserSnapshot>, CacheError> {
        self.check_available()?;
        Ok(self
            .raw(user_id)
            .await
            .and_then(|raw| decode_snapshot(user_id, &raw)))
    }

    async fn write(&self, user: &User) -> Result<(), CacheError> {
        self.check_available()?;
        let value = encode_snapshot(user)?;
        self.entries.write().await.insert(cache_key(user.id), value);
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.check_available()
    }
}
