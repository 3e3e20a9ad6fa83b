//! # Tessera Shared Library
//!
//! Account domain types and the building blocks the API server is assembled
//! from.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, signed tokens and the authorization gate
//! - `cache`: cache-aside profile cache (Redis and in-memory)
//! - `db`: PostgreSQL pool and migrations
//! - `models`: user records and profile snapshots
//! - `store`: primary user store (PostgreSQL and in-memory)

pub mod auth;
pub mod cache;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the Tessera shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
