/// Health check endpoint
///
/// Reports whether the primary store and the profile cache answer. The
/// service keeps serving with the cache down, so the endpoint always
/// returns 200 and reports `degraded` in the body.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "cache": "connected"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    /// Application version
    pub version: String,

    /// Primary store status
    pub database: String,

    /// Profile cache status
    pub cache: String,
}

fn describe(ok: bool) -> &'static str {
    if ok {
        "connected"
    } else {
        "disconnected"
    }
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let (database, cache) = tokio::join!(state.users.ping(), state.cache.ping());

    if let Err(e) = &database {
        tracing::warn!(error = %e, "Health check: user store unreachable");
    }
    if let Err(e) = &cache {
        tracing::warn!(error = %e, "Health check: profile cache unreachable");
    }

    let healthy = database.is_ok() && cache.is_ok();

    Ok(Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: describe(database.is_ok()).to_string(),
        cache: describe(cache.is_ok()).to_string(),
    }))
}
