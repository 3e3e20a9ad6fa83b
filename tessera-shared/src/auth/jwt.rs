/// JWT token issuance and verification
///
/// This module implements the token service behind login and the
/// authorization gate. Tokens carry the caller's identity claims plus an
/// expiration timestamp and are signed with a process-wide HMAC secret.
///
/// # Security
///
/// - **Algorithms**: HS256, HS384 or HS512, fixed at construction
/// - **Expiration**: 10 minutes by default, 30 minutes for login tokens
/// - **Validation**: algorithm pinning, signature, then expiry (no leeway)
/// - **Revocation**: none; a token is valid until `exp`
///
/// Verification checks the signature before the expiry, so a tampered token
/// is always reported as [`TokenError::Invalid`] and only an authentic,
/// out-of-date token yields [`TokenError::Expired`].
///
/// # Example
///
/// ```
/// use tessera_shared::auth::jwt::{Algorithm, Identity, TokenService, DEFAULT_TOKEN_TTL_MINUTES};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new("a-secret-that-is-at-least-32-bytes!", Algorithm::HS256)?;
///
/// let identity = Identity::new("user@example.com", 42);
/// let token = tokens.issue(&identity, DEFAULT_TOKEN_TTL_MINUTES)?;
///
/// let claims = tokens.verify(&token)?;
/// assert_eq!(claims.user_id, 42);
/// assert_eq!(claims.sub, "user@example.com");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub use jsonwebtoken::Algorithm;

/// Default token validity in minutes
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 10;

/// Validity of tokens issued by the login endpoint, in minutes
pub const LOGIN_TOKEN_TTL_MINUTES: i64 = 30;

/// Longest validity accepted from configuration (one year), in minutes
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Claim names owned by the token service
const RESERVED_CLAIMS: [&str; 4] = ["sub", "user_id", "iat", "exp"];

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Token is authentic but `exp` has passed
    #[error("token has expired")]
    Expired,

    /// Bad signature, malformed structure, wrong algorithm or missing claims
    ///
    /// The reason is kept for logs and never shown to clients.
    #[error("token is invalid")]
    Invalid(String),

    /// Failed to sign a token
    #[error("failed to create token: {0}")]
    CreateError(String),

    /// Algorithm is not a shared-secret HMAC algorithm
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Signing secret is empty
    #[error("signing secret must not be empty")]
    EmptySecret,
}

impl TokenError {
    /// Returns the diagnostic reason for an invalid token
    pub fn reason(&self) -> Option<&str> {
        match self {
            TokenError::Invalid(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Identity claims supplied by the caller when issuing a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Subject (the account email)
    pub sub: String,

    /// Numeric user ID
    pub user_id: i64,

    /// Additional claims carried verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    /// Creates identity claims with no extra claims
    pub fn new(sub: impl Into<String>, user_id: i64) -> Self {
        Self {
            sub: sub.into(),
            user_id,
            extra: Map::new(),
        }
    }

    /// Adds an extra claim
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// Full claim set as serialized inside a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (the account email)
    pub sub: String,

    /// Numeric user ID
    pub user_id: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Extra claims from the issuing [`Identity`]
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Builds a claim set from an identity, expiring `ttl` from now
    ///
    /// Reserved claim names in `identity.extra` are dropped so they cannot
    /// shadow the service-owned claims.
    ///
    /// # Errors
    ///
    /// `TokenError::CreateError` if `now + ttl` is not a representable time
    pub fn from_identity(identity: &Identity, ttl: Duration) -> Result<Self, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::CreateError(format!("token ttl out of range: {}", ttl)))?;
        let extra = identity
            .extra
            .iter()
            .filter(|(name, _)| !RESERVED_CLAIMS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self {
            sub: identity.sub.clone(),
            user_id: identity.user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            extra,
        })
    }

    /// Checks if the claim set has expired (`now >= exp`)
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Returns the identity portion of the claim set
    pub fn identity(&self) -> Identity {
        Identity {
            sub: self.sub.clone(),
            user_id: self.user_id,
            extra: self.extra.clone(),
        }
    }
}

/// Parses an algorithm name from configuration
///
/// Only HMAC algorithms are accepted; `none` and asymmetric algorithms are
/// rejected.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, TokenError> {
    let algorithm = Algorithm::from_str(name.trim().to_uppercase().as_str())
        .map_err(|_| TokenError::UnsupportedAlgorithm(name.to_string()))?;
    ensure_hmac(algorithm)?;
    Ok(algorithm)
}

fn ensure_hmac(algorithm: Algorithm) -> Result<(), TokenError> {
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(()),
        other => Err(TokenError::UnsupportedAlgorithm(format!("{:?}", other))),
    }
}

/// Signs and verifies identity tokens
///
/// Holds the immutable secret and algorithm. Safe to share across requests
/// behind an `Arc`.
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service for the given secret and algorithm
    ///
    /// # Errors
    ///
    /// - `TokenError::EmptySecret` if `secret` is empty
    /// - `TokenError::UnsupportedAlgorithm` for non-HMAC algorithms
    pub fn new(secret: &str, algorithm: Algorithm) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        ensure_hmac(algorithm)?;

        // Expiry is checked by hand after the signature so that `now == exp`
        // counts as expired and expiry never masks tampering.
        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Returns the configured signing algorithm
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Issues a token valid for `ttl_minutes`
    ///
    /// The caller's identity is copied, never modified.
    pub fn issue(&self, identity: &Identity, ttl_minutes: i64) -> Result<String, TokenError> {
        let ttl = Duration::try_minutes(ttl_minutes).ok_or_else(|| {
            TokenError::CreateError(format!("token ttl out of range: {} minutes", ttl_minutes))
        })?;
        self.issue_with_ttl(identity, ttl)
    }

    /// Issues a token valid for an arbitrary duration
    ///
    /// A zero or negative `ttl` produces a token that is already expired,
    /// which is useful in tests.
    pub fn issue_with_ttl(&self, identity: &Identity, ttl: Duration) -> Result<String, TokenError> {
        let claims = Claims::from_identity(identity, ttl)?;
        self.sign(&claims)
    }

    /// Signs a prepared claim set
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| TokenError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Verifies a token and returns its claims
    ///
    /// # Errors
    ///
    /// - `TokenError::Invalid` for a bad signature, malformed token, missing
    ///   claims or an algorithm other than the configured one
    /// - `TokenError::Expired` when the token is authentic and `now >= exp`
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        let claims = token_data.claims;
        if claims.is_expired() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
