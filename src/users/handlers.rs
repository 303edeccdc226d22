use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::PublicUser,
        extractors::AuthUser,
        handlers::{check_password_strength, normalize_email},
        password::{hash_password, verify_password},
    },
    dto::MessageResponse,
    error::ApiError,
    state::AppState,
    users::dto::{ChangePasswordRequest, UpdateProfileRequest},
    users::repo::User,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me).patch(update_me))
        .route("/users/me/password", post(change_password))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let pool = state.db.pool()?;
    // The token is trusted for routing, but the profile read must still
    // resolve to a live account.
    let record = User::find_by_id(pool, user.id).await?.ok_or_else(|| {
        warn!(user_id = %user.id, "token subject no longer exists");
        ApiError::Unauthenticated
    })?;
    Ok(Json(PublicUser::from(record)))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    if payload.email.is_none() && payload.full_name.is_none() {
        return Err(ApiError::Validation("Nothing to update".into()));
    }

    let email = payload
        .email
        .as_deref()
        .map(normalize_email)
        .transpose()?;

    let full_name = match payload.full_name.as_deref().map(str::trim) {
        Some("") => return Err(ApiError::Validation("Full name must not be empty".into())),
        other => other,
    };

    let pool = state.db.pool()?;
    let record = User::update_profile(pool, user.id, email.as_deref(), full_name).await?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(PublicUser::from(record)))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    check_password_strength(&payload.new_password)?;

    let pool = state.db.pool()?;
    let record = User::find_by_id(pool, user.id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !verify_password(&payload.current_password, &record.password_hash)? {
        warn!(user_id = %user.id, "password change with wrong current password");
        return Err(ApiError::InvalidCredentials);
    }

    let hash = hash_password(&payload.new_password)?;
    User::update_password(pool, user.id, &hash).await?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(MessageResponse {
        message: "Password updated",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRef;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::auth::authz::Role;
    use crate::auth::jwt::JwtKeys;

    fn bearer(state: &AppState) -> String {
        let keys = JwtKeys::from_ref(state);
        let token = keys.sign(uuid::Uuid::new_v4(), Role::User).expect("sign");
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn me_without_token_is_unauthorized() {
        let app = routes().with_state(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/users/me")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_without_store_is_service_unavailable() {
        let state = AppState::fake_unconfigured();
        let auth = bearer(&state);
        let app = routes().with_state(state);
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/users/me")
                    .header(header::AUTHORIZATION, auth)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn empty_patch_is_bad_request() {
        let state = AppState::fake();
        let auth = bearer(&state);
        let app = routes().with_state(state);
        let res = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/users/me")
                    .header(header::AUTHORIZATION, auth)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn short_new_password_is_bad_request() {
        let state = AppState::fake();
        let auth = bearer(&state);
        let app = routes().with_state(state);
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/users/me/password")
                    .header(header::AUTHORIZATION, auth)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"current_password":"Secret123","new_password":"short"}"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
