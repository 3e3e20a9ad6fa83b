/// API route handlers
///
/// - `health`: Health check endpoint
/// - `account`: Account endpoints (register, login, update, profile)

pub mod account;
pub mod health;
