/// Configuration management for the API server
///
/// Loaded once at startup from environment variables (`.env` is honored in
/// development). Tests build a [`Config`] from an explicit variable list
/// through [`Config::from_lookup`].
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: bind address (default `127.0.0.1:8080`)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for any (default `*`)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
/// - `DATABASE_QUERY_TIMEOUT_SECS`: per-query timeout (default 5)
/// - `JWT_SECRET` or `SECRET_KEY`: signing secret, 32+ characters (required)
/// - `JWT_ALGORITHM` or `ALGORITHM`: HS256, HS384 or HS512 (default HS256)
/// - `LOGIN_TOKEN_TTL_MINUTES`: login token validity (default 30, at most one year)
/// - `REDIS_*`: see [`RedisConfig::from_env`]
/// - `CACHE_BACKFILL_ON_MISS`: cache profiles read from the store (default false)
/// - `PASSWORD_HASH_MEMORY_KIB` / `_ITERATIONS` / `_PARALLELISM`: Argon2 cost
///
/// # Example
///
/// ```no_run
/// use tessera_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use tessera_shared::auth::jwt::{self, Algorithm, LOGIN_TOKEN_TTL_MINUTES, MAX_TOKEN_TTL_MINUTES};
use tessera_shared::auth::password::HashParams;
use tessera_shared::cache::RedisConfig;

/// Minimum accepted length of the signing secret
const MIN_SECRET_LEN: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token configuration
    pub jwt: JwtConfig,

    /// Redis connection settings
    pub redis: RedisConfig,

    /// Cache usage policy
    pub cache: CacheConfig,

    /// Argon2 work factor
    pub password: HashParams,
}

/// API server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Per-query timeout in seconds
    pub query_timeout_secs: u64,
}

/// Token configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared signing secret
    pub secret: String,

    /// HMAC signing algorithm
    pub algorithm: Algorithm,

    /// Validity of tokens issued at login, in minutes
    pub login_ttl_minutes: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("login_ttl_minutes", &self.login_ttl_minutes)
            .finish()
    }
}

/// Cache usage policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Write profiles fetched from the store on a cache miss back to the cache
    pub backfill_on_miss: bool,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does not
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api = ApiConfig {
            host: lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "API_PORT", 8080)?,
            cors_origins: lookup("CORS_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        };

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").context("DATABASE_URL environment variable is required")?,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            query_timeout_secs: parse_or(&lookup, "DATABASE_QUERY_TIMEOUT_SECS", 5)?,
        };

        let secret = lookup("JWT_SECRET")
            .or_else(|| lookup("SECRET_KEY"))
            .context("JWT_SECRET environment variable is required")?;
        if secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_SECRET_LEN);
        }

        let algorithm_name = lookup("JWT_ALGORITHM")
            .or_else(|| lookup("ALGORITHM"))
            .unwrap_or_else(|| "HS256".to_string());
        let algorithm = jwt::parse_algorithm(&algorithm_name)?;

        let login_ttl_minutes = parse_or(&lookup, "LOGIN_TOKEN_TTL_MINUTES", LOGIN_TOKEN_TTL_MINUTES)?;
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&login_ttl_minutes) {
            anyhow::bail!(
                "LOGIN_TOKEN_TTL_MINUTES must be between 1 and {}",
                MAX_TOKEN_TTL_MINUTES
            );
        }

        let defaults = HashParams::default();
        let password = HashParams {
            memory_kib: parse_or(&lookup, "PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&lookup, "PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&lookup, "PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            api,
            database,
            jwt: JwtConfig {
                secret,
                algorithm,
                login_ttl_minutes,
            },
            redis: RedisConfig::from_lookup(&lookup)?,
            cache: CacheConfig {
                backfill_on_miss: parse_bool(&lookup, "CACHE_BACKFILL_ON_MISS")?,
            },
            password,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether any CORS origin is allowed
    pub fn cors_permissive(&self) -> bool {
        self.api.cors_origins.is_empty() || self.api.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_or<T, F>(lookup: &F, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: '{}'", name, raw)),
        None => Ok(default),
    }
}

fn parse_bool<F>(lookup: &F, name: &str) -> anyhow::Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).map(|raw| raw.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(raw) => match raw.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "" | "0" | "false" | "no" | "off" => Ok(false),
            _ => anyhow::bail!("{} must be a boolean, got '{}'", name, raw),
        },
    }
}

/// Log output format, read from `LOG_FORMAT` before the config is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output
    Pretty,

    /// One JSON object per event
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::parse(env::var("LOG_FORMAT").ok().as_deref())
    }

    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}
