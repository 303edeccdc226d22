use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::authz::Role;
use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;

/// Authenticated subject, resolved from the bearer token. Pure claim
/// extraction: the store is never queried here.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                warn!("missing Authorization header");
                ApiError::Unauthenticated
            })?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| {
                warn!("Authorization header is not a bearer token");
                ApiError::Unauthenticated
            })?;

        // The rejection reason stays in the logs; clients get one uniform 401.
        let claims = keys.verify(token).map_err(|e| {
            warn!(reason = %e, "bearer token rejected");
            ApiError::Unauthenticated
        })?;

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}
