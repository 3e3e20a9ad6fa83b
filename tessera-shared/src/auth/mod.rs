/// Authentication and session core
///
/// # Modules
///
/// - [`password`]: Argon2id credential hashing and verification
/// - [`jwt`]: signed, time-limited identity tokens
/// - [`middleware`]: authorization gate for protected routes
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with a configurable work factor
/// - **Tokens**: HMAC-signed JWTs, algorithm pinned by configuration
/// - **Expiry vs. tampering**: reported as distinct errors
/// - **Constant-time Comparison**: password verification is constant-time
///
/// # Example
///
/// ```no_run
/// use tessera_shared::auth::jwt::{Algorithm, Identity, TokenService, LOGIN_TOKEN_TTL_MINUTES};
/// use tessera_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let tokens = TokenService::new("a-secret-that-is-at-least-32-bytes!", Algorithm::HS256)?;
/// let token = tokens.issue(&Identity::new("user@example.com", 1), LOGIN_TOKEN_TTL_MINUTES)?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
