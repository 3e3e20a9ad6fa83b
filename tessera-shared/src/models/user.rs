/// User account model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id            BIGSERIAL PRIMARY KEY,
///     first_name    VARCHAR(100) NOT NULL,
///     last_name     VARCHAR(100) NOT NULL,
///     email         VARCHAR(255) NOT NULL CONSTRAINT users_email_key UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Persistence lives behind [`crate::store::UserStore`]; this module only
/// defines the data shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account as stored in the primary store
///
/// Passwords are stored as Argon2id PHC strings, never in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// Numeric user ID
    pub id: i64,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Email address, unique across all users
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name used in update confirmations
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Projects the cacheable profile fields
    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot::from(self)
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,
}

/// Input for updating an existing user
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,

    /// New password hash (already hashed)
    pub password_hash: Option<String>,
}

impl UpdateUser {
    /// Returns true if no field would change
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
    }
}

/// Public profile fields, as cached and as returned by `GET /profile`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&User> for UserSnapshot {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}
