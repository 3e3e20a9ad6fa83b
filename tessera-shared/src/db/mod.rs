/// Database plumbing
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health check and shutdown
/// - `migrations`: embedded schema migrations
///
/// Queries against the `users` table live in [`crate::store::postgres`].

pub mod migrations;
pub mod pool;
