use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    analysis::dto::{CreateAnalysisRequest, UpdateAnalysisRequest},
    analysis::repo::AnalysisRequest,
    auth::{authz::ensure_owner, extractors::AuthUser},
    dto::Pagination,
    error::ApiError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analysis", get(list_analyses).post(create_analysis))
        .route("/analysis/:id", get(get_analysis).patch(update_analysis))
}

#[instrument(skip(state, payload))]
pub async fn create_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateAnalysisRequest>,
) -> Result<(StatusCode, Json<AnalysisRequest>), ApiError> {
    let file_name = payload.file_name.trim();
    if file_name.is_empty() {
        return Err(ApiError::Validation("File name is required".into()));
    }

    let pool = state.db.pool()?;
    let row = AnalysisRequest::create(
        pool,
        user.id,
        file_name,
        payload.file_url.as_deref(),
        payload.analysis_summary.as_deref(),
    )
    .await?;

    info!(analysis_id = %row.id, user_id = %user.id, "analysis request created");
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state))]
pub async fn list_analyses(
    State(state): State<AppState>,
    user: AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<AnalysisRequest>>, ApiError> {
    let pool = state.db.pool()?;
    let rows = AnalysisRequest::list_by_owner(pool, user.id, p.limit, p.offset).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisRequest>, ApiError> {
    let pool = state.db.pool()?;
    let row = AnalysisRequest::find_by_id(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Analysis request"))?;
    ensure_owner(&user, row.created_by)?;
    Ok(Json(row))
}

#[instrument(skip(state, payload))]
pub async fn update_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAnalysisRequest>,
) -> Result<Json<AnalysisRequest>, ApiError> {
    let pool = state.db.pool()?;
    let row = AnalysisRequest::find_by_id(pool, id)
        .await?
        .ok_or(ApiError::NotFound("Analysis request"))?;
    ensure_owner(&user, row.created_by)?;

    let updated = AnalysisRequest::update(
        pool,
        id,
        payload.analysis_summary.as_deref(),
        payload.status,
    )
    .await?;

    info!(analysis_id = %id, user_id = %user.id, "analysis request updated");
    Ok(Json(updated))
}
