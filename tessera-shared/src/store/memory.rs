/// In-memory user store
///
/// Mirrors the PostgreSQL store's semantics (sequential IDs from 1, unique
/// emails, partial updates) without a database. Used by the API test suite.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{StoreError, StoreResult, UserStore};
use crate::models::user::{CreateUser, UpdateUser, User};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    users: BTreeMap<i64, User>,
}

/// Process-local user store
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    /// Returns true if no users are stored
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes a user, simulating a row deleted out from under a session
    pub async fn remove(&self, id: i64) -> Option<User> {
        self.inner.write().await.users.remove(&id)
    }
}

fn email_taken(inner: &Inner, email: &str, except: Option<i64>) -> bool {
    inner
        .users
        .values()
        .any(|u| u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        if email_taken(&inner, &data.email, None) {
            return Err(StoreError::EmailTaken);
        }

        inner.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.next_id,
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update(&self, id: i64, data: UpdateUser) -> StoreResult<Option<User>> {
        let mut inner = self.inner.write().await;
        if let Some(email) = data.email.as_deref() {
            if email_taken(&inner, email, Some(id)) {
                return Err(StoreError::EmailTaken);
            }
        }

        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(first_name) = data.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = data.last_name {
            user.last_name = last_name;
        }
        if let Some(email) = data.email {
            user.email = email;
        }
        if let Some(password_hash) = data.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = InMemoryUserStore::new();
        let a = store.create(new_user("a@x.com")).await.unwrap();
        let b = store.create(new_user("b@x.com")).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = InMemoryUserStore::new();
        store.create(new_user("a@x.com")).await.unwrap();

        let result = store.create(new_user("a@x.com")).await;
        assert!(matches!(result, Err(StoreError::EmailTaken)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("a@x.com")).await.unwrap();

        let updated = store
            .update(
                user.id,
                UpdateUser {
                    last_name: Some("Changed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.first_name, "Test");
        assert_eq!(updated.last_name, "Changed");
        assert_eq!(updated.email, "a@x.com");
        assert_eq!(updated.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_update_to_taken_email_fails() {
        let store = InMemoryUserStore::new();
        store.create(new_user("a@x.com")).await.unwrap();
        let b = store.create(new_user("b@x.com")).await.unwrap();

        let result = store
            .update(
                b.id,
                UpdateUser {
                    email: Some("a@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_update_to_own_email_is_allowed() {
        let store = InMemoryUserStore::new();
        let a = store.create(new_user("a@x.com")).await.unwrap();

        let result = store
            .update(
                a.id,
                UpdateUser {
                    email: Some("a@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_update_missing_user_returns_none() {
        let store = InMemoryUserStore::new();
        let result = store.update(99, UpdateUser::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryUserStore::new();
        let a = store.create(new_user("a@x.com")).await.unwrap();

        assert!(store.remove(a.id).await.is_some());
        assert!(store.find_by_id(a.id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }
}
