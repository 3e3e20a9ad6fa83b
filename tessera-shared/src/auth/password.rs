/// Password hashing module using Argon2id
///
/// This module provides the credential hasher used for registration, login and
/// password changes. Hashes are produced with Argon2id, a memory-hard adaptive
/// algorithm whose work factor can be raised as hardware gets faster.
///
/// # Security
///
/// - **Algorithm**: Argon2id (hybrid of Argon2i and Argon2d)
/// - **Memory**: 64 MB (65536 KB) by default
/// - **Iterations**: 3 passes by default
/// - **Parallelism**: 4 lanes by default
/// - **Output**: 32-byte hash in PHC string format
///
/// The parameters are embedded in every PHC string, so raising the work factor
/// does not invalidate hashes created with an older one.
///
/// # Example
///
/// ```
/// use tessera_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("super_secret_password_123")?;
///
/// assert!(verify_password("super_secret_password_123", &hash)?);
/// assert!(!verify_password("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not a valid PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Argon2id work factor
///
/// Defaults match the recommended interactive-login profile. Tests use
/// [`HashParams::fast`] to keep suites quick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes over memory
    pub iterations: u32,

    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl HashParams {
    /// Minimal work factor for tests and local tooling
    pub fn fast() -> Self {
        Self {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Configurable credential hasher
///
/// Cheap to copy; the application state holds one and hands copies to
/// blocking tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialHasher {
    params: HashParams,
}

impl CredentialHasher {
    /// Creates a hasher with the given work factor
    pub fn new(params: HashParams) -> Self {
        Self { params }
    }

    /// Returns the configured work factor
    pub fn params(&self) -> HashParams {
        self.params
    }

    /// Hashes a password with a fresh random salt
    ///
    /// # Returns
    ///
    /// PHC string, e.g. `$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::HashError` if the parameters are rejected by
    /// argon2 or hashing fails.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let params = ParamsBuilder::new()
            .m_cost(self.params.memory_kib)
            .t_cost(self.params.iterations)
            .p_cost(self.params.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    /// Verifies a password against a stored hash
    ///
    /// Comparison is constant-time. The work factor is read from the hash
    /// itself, not from `self`.
    ///
    /// # Returns
    ///
    /// `Ok(true)` on match, `Ok(false)` on mismatch
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidHash` if `hash` is not a PHC string.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
        }
    }
}

/// Hashes a password using the default work factor
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    CredentialHasher::default().hash(password)
}

/// Verifies a password against a PHC hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    CredentialHasher::default().verify(password, hash)
}
