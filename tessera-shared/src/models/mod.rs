/// Data models
///
/// # Models
///
/// - `user`: user accounts, create/update inputs and the cached profile snapshot
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use tessera_shared::models::user::{User, UserSnapshot};
///
/// let user = User {
///     id: 1,
///     first_name: "Ada".to_string(),
///     last_name: "Lovelace".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
///
/// let snapshot = UserSnapshot::from(&user);
/// assert_eq!(snapshot.email, "ada@example.com");
/// ```

pub mod user;
