use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, SignupRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    dto::MessageResponse,
    error::ApiError,
    state::AppState,
    users::repo::User,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trim + lowercase, then syntax-check. All email input goes through this
/// before it reaches the store.
pub(crate) fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    Ok(email)
}

pub(crate) fn check_password_strength(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::Validation("Password too short".into()));
    }
    Ok(())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = normalize_email(&payload.email)?;
    check_password_strength(&payload.password)?;

    let full_name = payload.full_name.trim();
    if full_name.is_empty() {
        return Err(ApiError::Validation("Full name is required".into()));
    }

    let pool = state.db.pool()?;
    let hash = hash_password(&payload.password)?;

    // No pre-check on the email: the unique index arbitrates, and the repo
    // maps the violation to DuplicateEmail. Two concurrent signups for the
    // same address get exactly one 201 and one 409.
    let user = User::create(pool, &email, &hash, full_name).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, user.role)?;

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: PublicUser::from(user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = normalize_email(&payload.email)?;
    let pool = state.db.pool()?;

    // Unknown email and wrong password answer identically.
    let user = match User::find_by_email(pool, &email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = if payload.remember {
        keys.sign_remember(user.id, user.role)?
    } else {
        keys.sign(user.id, user.role)?
    };

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(user),
    }))
}

/// Tokens are not tracked server-side; logout is the client discarding its
/// copy. The endpoint exists so the frontend has something to call.
#[instrument]
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logout successful",
    })
}
