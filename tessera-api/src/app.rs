/// Application state and router builder
///
/// The state bundles the primary store, the profile cache and the auth
/// services behind cheap-to-clone handles. Store and cache are trait objects,
/// so the binary wires PostgreSQL and Redis while tests wire in-memory fakes.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tessera_api::{app::{build_router, AppState}, config::Config};
/// use tessera_shared::cache::InMemoryProfileCache;
/// use tessera_shared::store::InMemoryUserStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(
///     config,
///     Arc::new(InMemoryUserStore::new()),
///     Arc::new(InMemoryProfileCache::new()),
/// )?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tessera_shared::{
    auth::{
        jwt::{TokenError, TokenService},
        middleware::{authorization_gate, AuthorizationGate},
        password::CredentialHasher,
    },
    cache::ProfileCache,
    store::UserStore,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Primary user store
    pub users: Arc<dyn UserStore>,

    /// Profile cache
    pub cache: Arc<dyn ProfileCache>,

    /// Token issuer and verifier
    pub tokens: Arc<TokenService>,

    /// Password hasher with the configured work factor
    pub hasher: CredentialHasher,

    /// Gate guarding the protected paths
    pub gate: AuthorizationGate,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates application state from configuration and backends
    ///
    /// # Errors
    ///
    /// Returns an error if the signing configuration is unusable.
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        cache: Arc<dyn ProfileCache>,
    ) -> Result<Self, TokenError> {
        let tokens = Arc::new(TokenService::new(&config.jwt.secret, config.jwt.algorithm)?);

        Ok(Self {
            users,
            cache,
            gate: AuthorizationGate::new(tokens.clone()),
            tokens,
            hasher: CredentialHasher::new(config.password),
            config: Arc::new(config),
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /
/// ├── GET  /health      # public
/// ├── POST /register    # public
/// ├── POST /login       # public
/// ├── PUT  /update      # bearer token
/// └── GET  /profile     # bearer token
/// ```
///
/// # Middleware Stack
///
/// Applied in order (inner to outer):
/// 1. Authorization gate (acts only on protected paths)
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/register", post(routes::account::register))
        .route("/login", post(routes::account::login))
        .route("/update", put(routes::account::update))
        .route("/profile", get(routes::account::profile))
        .layer(axum::middleware::from_fn_with_state(
            state.gate.clone(),
            authorization_gate,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
