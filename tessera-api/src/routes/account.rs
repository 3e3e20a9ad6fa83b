/// Account endpoints
///
/// # Endpoints
///
/// - `POST /register` - Create an account
/// - `POST /login` - Exchange credentials for a bearer token
/// - `PUT /update` - Change profile fields (bearer token)
/// - `GET /profile` - Read the profile (bearer token)
///
/// Emails are trimmed and lowercased before validation and lookup.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use tessera_shared::{
    auth::{jwt::Identity, middleware::AuthContext, password::CredentialHasher},
    models::user::{CreateUser, UpdateUser, User, UserSnapshot},
    store::StoreError,
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed bearer token
    pub access_token: String,

    /// Always `"bearer"`
    pub token_type: String,
}

/// Update request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRequest {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: Option<String>,
}

/// Update response
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub message: String,

    /// `"{first_name} {last_name}"` after the update
    pub username: String,
}

/// Canonical form of an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Identity attached by the authorization gate
fn require_identity(context: Option<Extension<AuthContext>>) -> ApiResult<AuthContext> {
    context
        .map(|Extension(context)| context)
        .ok_or_else(|| ApiError::Unauthorized("no user_id in token".to_string()))
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

async fn find_user(state: &AppState, user_id: i64) -> ApiResult<User> {
    state.users.find_by_id(user_id).await?.ok_or_else(user_not_found)
}

async fn hash_password(hasher: CredentialHasher, password: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| ApiError::InternalError(format!("hashing task failed: {}", e)))?
        .map_err(ApiError::from)
}

async fn verify_password(hasher: CredentialHasher, password: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| ApiError::InternalError(format!("verification task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /register
/// Content-Type: application/json
///
/// {
///   "first_name": "Ada",
///   "last_name": "Lovelace",
///   "email": "ada@example.com",
///   "password": "secret1"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the JSON string
/// `"user with email: ada@example.com - created successfully"`.
///
/// # Errors
///
/// - `400 Bad Request`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(mut req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<String>)> {
    req.email = normalize_email(&req.email);
    req.validate()?;

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let password_hash = hash_password(state.hasher, req.password).await?;

    let user = state
        .users
        .create(CreateUser {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration
            StoreError::EmailTaken => ApiError::BadRequest("Email already registered".to_string()),
            other => other.into(),
        })?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(format!("user with email: {} - created successfully", user.email)),
    ))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "secret1"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "token_type": "bearer"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: `"Invalid email"` or `"Invalid password"`
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(mut req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.email = normalize_email(&req.email);
    req.validate()?;

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid email".to_string()))?;

    let valid = verify_password(state.hasher, req.password, user.password_hash.clone()).await?;
    if !valid {
        tracing::debug!(user_id = user.id, "Login rejected: wrong password");
        return Err(ApiError::BadRequest("Invalid password".to_string()));
    }

    let identity = Identity::new(user.email.clone(), user.id);
    let access_token = state
        .tokens
        .issue(&identity, state.config.jwt.login_ttl_minutes)?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Update profile fields
///
/// Writes to the primary store first, then refreshes the cache. A failed
/// cache refresh is logged and does not fail the request. A body with no
/// fields leaves the stored row untouched.
///
/// # Endpoint
///
/// ```text
/// PUT /update
/// Authorization: Bearer eyJ...
/// Content-Type: application/json
///
/// { "last_name": "Byron" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "User updated successfully",
///   "username": "Ada Byron"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: No identity attached
/// - `404 Not Found`: User no longer exists
/// - `409 Conflict`: Email belongs to another account
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update(
    State(state): State<AppState>,
    context: Option<Extension<AuthContext>>,
    Json(mut req): Json<UpdateRequest>,
) -> ApiResult<Json<UpdateResponse>> {
    let identity = require_identity(context)?;

    req.email = req.email.as_deref().map(normalize_email);
    req.validate()?;

    let mut changes = UpdateUser {
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
        password_hash: None,
    };

    let user = if changes.is_empty() && req.password.is_none() {
        find_user(&state, identity.user_id).await?
    } else {
        if let Some(password) = req.password {
            // Only pay for a hash when the account still exists
            find_user(&state, identity.user_id).await?;
            changes.password_hash = Some(hash_password(state.hasher, password).await?);
        }

        state
            .users
            .update(identity.user_id, changes)
            .await?
            .ok_or_else(user_not_found)?
    };

    if let Err(e) = state.cache.write(&user).await {
        tracing::warn!(user_id = user.id, error = %e, "Profile cache refresh failed");
    }

    tracing::info!(user_id = user.id, "User updated");

    Ok(Json(UpdateResponse {
        message: "User updated successfully".to_string(),
        username: user.full_name(),
    }))
}

/// Read the caller's profile
///
/// Served from the cache when present; otherwise read from the primary store
/// and, if `CACHE_BACKFILL_ON_MISS` is set, written back to the cache.
///
/// # Endpoint
///
/// ```text
/// GET /profile
/// Authorization: Bearer eyJ...
/// ```
///
/// # Response
///
/// ```json
/// {
///   "first_name": "Ada",
///   "last_name": "Byron",
///   "email": "ada@example.com"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: No identity attached
/// - `404 Not Found`: User no longer exists
pub async fn profile(
    State(state): State<AppState>,
    context: Option<Extension<AuthContext>>,
) -> ApiResult<Json<UserSnapshot>> {
    let identity = require_identity(context)?;
    let user_id = identity.user_id;

    let cache_healthy = match state.cache.read(user_id).await {
        Ok(Some(snapshot)) => {
            tracing::debug!(user_id, "Profile cache hit");
            return Ok(Json(snapshot));
        }
        Ok(None) => {
            tracing::debug!(user_id, "Profile cache miss");
            true
        }
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Profile cache read failed, using primary store");
            false
        }
    };

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(user_not_found)?;

    if cache_healthy && state.config.cache.backfill_on_miss {
        if let Err(e) = state.cache.write(&user).await {
            tracing::warn!(user_id, error = %e, "Profile cache backfill failed");
        }
    }

    Ok(Json(user.snapshot()))
}
