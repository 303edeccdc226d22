use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{authz::ensure_owner, extractors::AuthUser},
    dto::Pagination,
    error::ApiError,
    state::AppState,
    support::dto::{CreateTicketRequest, UpdateTicketRequest},
    support::repo::SupportTicket,
    users::repo::User,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/support/tickets", get(list_tickets).post(create_ticket))
        .route("/support/tickets/:id", get(get_ticket).patch(update_ticket))
}

#[instrument(skip(state, payload))]
pub async fn create_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<SupportTicket>), ApiError> {
    let request_type = payload.request_type.trim();
    let details = payload.details.trim();
    if request_type.is_empty() || details.is_empty() {
        return Err(ApiError::Validation(
            "request_type and details are required".into(),
        ));
    }

    let pool = state.db.pool()?;
    // The ticket records the owner's email for the support inbox; claims
    // don't carry it, so resolve the account first.
    let account = User::find_by_id(pool, user.id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    let row =
        SupportTicket::create(pool, user.id, &account.email, request_type, details).await?;

    info!(ticket_id = %row.id, user_id = %user.id, "support ticket created");
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state))]
pub async fn list_tickets(
    State(state): State<AppState>,
    user: AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<SupportTicket>>, ApiError> {
    let pool = state.db.pool()?;
    let rows = SupportTicket::list_by_owner(pool, user.id, p.limit, p.offset).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SupportTicket>, ApiError> {
    let pool = state.db.pool()?;
    let row = SupportTicket::find_by_id(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Ticket"))?;
    ensure_owner(&user, row.created_by)?;
    Ok(Json(row))
}

#[instrument(skip(state, payload))]
pub async fn update_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTicketRequest>,
) -> Result<Json<SupportTicket>, ApiError> {
    let pool = state.db.pool()?;
    let row = SupportTicket::find_by_id(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Ticket"))?;
    ensure_owner(&user, row.created_by)?;

    let updated = SupportTicket::update_status(pool, id, payload.status).await?;

    info!(ticket_id = %id, user_id = %user.id, "support ticket updated");
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRef;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    use crate::auth::authz::Role;
    use crate::auth::jwt::JwtKeys;

    #[tokio::test]
    async fn list_without_token_is_unauthorized() {
        let app = routes().with_state(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/support/tickets")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_with_blank_fields_is_bad_request() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign(Uuid::new_v4(), Role::User).expect("sign");
        let app = routes().with_state(state);
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/support/tickets")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"request_type":"","details":"  "}"#))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_without_store_is_service_unavailable() {
        let state = AppState::fake_unconfigured();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign(Uuid::new_v4(), Role::User).expect("sign");
        let app = routes().with_state(state);
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/support/tickets")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"request_type":"billing","details":"invoice missing"}"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
