/// Authorization gate for protected routes
///
/// The gate intercepts every request, lets unprotected paths through
/// untouched, and for protected paths requires a valid
/// `Authorization: Bearer <token>` header. On success the caller's identity
/// is attached to the request extensions as an [`AuthContext`].
///
/// # Request flow
///
/// ```text
/// UNCHECKED ──(path not protected)──> PASSTHROUGH ──> next
///     │
///     └─(path protected)──> HEADER_CHECK ──(missing / not Bearer)──> REJECTED 401
///                                │
///                                └──> TOKEN_CHECK ──(expired / invalid)──> REJECTED 401
///                                          │
///                                          └──> AUTHORIZED (AuthContext attached) ──> next
/// ```
///
/// The decision logic lives in [`AuthorizationGate::check`], which knows
/// nothing about axum. [`authorization_gate`] adapts it to an axum
/// `from_fn_with_state` interceptor.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Extension, Router};
/// use tessera_shared::auth::jwt::{Algorithm, TokenService};
/// use tessera_shared::auth::middleware::{authorization_gate, AuthContext, AuthorizationGate};
///
/// async fn profile(Extension(auth): Extension<AuthContext>) -> String {
///     format!("user {}", auth.user_id)
/// }
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = Arc::new(TokenService::new("a-secret-that-is-at-least-32-bytes!", Algorithm::HS256)?);
/// let gate = AuthorizationGate::new(tokens);
///
/// let app: Router = Router::new()
///     .route("/profile", get(profile))
///     .layer(middleware::from_fn_with_state(gate, authorization_gate));
/// # Ok(())
/// # }
/// ```

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

use super::jwt::{TokenError, TokenService};

/// Paths guarded by default
pub const PROTECTED_PATHS: [&str; 2] = ["/update", "/profile"];

/// Identity attached to authorized requests
///
/// Handlers extract it with `Extension<AuthContext>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: i64,

    /// Token subject (the account email at login time)
    pub subject: String,
}

/// Reasons a protected request is rejected
///
/// Every variant maps to 401. The header variant uses one generic message so
/// clients cannot tell a missing header from a malformed one.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Header absent, not UTF-8, not `Bearer`, or without a token part
    #[error("Token missing or invalid")]
    MissingOrMalformed,

    /// Token failed verification
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": "unauthorized",
            "message": self.to_string(),
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Outcome of running the gate on one request
#[derive(Debug)]
pub enum GateDecision {
    /// Path is not protected; continue without identity
    Passthrough,

    /// Token verified; continue with identity attached
    Authorized(AuthContext),

    /// Request must be answered with 401
    Rejected(AuthError),
}

/// Request interceptor enforcing bearer tokens on protected paths
///
/// Holds only immutable configuration, so clones are cheap and requests
/// never contend on shared state.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    tokens: Arc<TokenService>,
    protected: Arc<HashSet<String>>,
}

impl AuthorizationGate {
    /// Creates a gate protecting [`PROTECTED_PATHS`]
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self::with_protected_paths(tokens, PROTECTED_PATHS)
    }

    /// Creates a gate protecting an explicit set of paths
    pub fn with_protected_paths<I, P>(tokens: Arc<TokenService>, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            tokens,
            protected: Arc::new(paths.into_iter().map(Into::into).collect()),
        }
    }

    /// Returns true if requests to `path` must carry a valid token
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.contains(path)
    }

    /// Decides what to do with a request
    ///
    /// `authorization` is the raw `Authorization` header value, if any.
    pub fn check(&self, path: &str, authorization: Option<&str>) -> GateDecision {
        if !self.is_protected(path) {
            return GateDecision::Passthrough;
        }

        match self.authorize(authorization) {
            Ok(context) => GateDecision::Authorized(context),
            Err(err) => GateDecision::Rejected(err),
        }
    }

    /// Validates an `Authorization` header value and extracts the identity
    pub fn authorize(&self, authorization: Option<&str>) -> Result<AuthContext, AuthError> {
        let header = authorization.ok_or(AuthError::MissingOrMalformed)?;
        let token = bearer_token(header).ok_or(AuthError::MissingOrMalformed)?;

        let claims = self.tokens.verify(token)?;

        Ok(AuthContext {
            user_id: claims.user_id,
            subject: claims.sub,
        })
    }
}

/// Extracts the token after the first space of a `Bearer` header
///
/// The scheme is matched case-insensitively.
fn bearer_token(header: &str) -> Option<&str> {
    let scheme = header.get(..6)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    header.split_once(' ').map(|(_, token)| token)
}

/// Axum adapter for [`AuthorizationGate`]
///
/// Install with `axum::middleware::from_fn_with_state(gate, authorization_gate)`.
pub async fn authorization_gate(
    State(gate): State<AuthorizationGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match gate.check(req.uri().path(), authorization) {
        GateDecision::Passthrough => Ok(next.run(req).await),
        GateDecision::Authorized(context) => {
            tracing::debug!(user_id = context.user_id, path = %req.uri().path(), "Request authorized");
            req.extensions_mut().insert(context);
            Ok(next.run(req).await)
        }
        GateDecision::Rejected(err) => {
            let detail = match &err {
                AuthError::Token(token_err) => token_err.reason(),
                AuthError::MissingOrMalformed => None,
            };
            tracing::debug!(path = %req.uri().path(), reason = %err, ?detail, "Request rejected");
            Err(err)
        }
    }
}
