use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "analysis_status", rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisRequest {
    pub id: Uuid,
    /// Owner. Written once at insert, never updated.
    pub created_by: Uuid,
    pub file_name: String,
    pub file_url: Option<String>,
    pub analysis_summary: Option<String>,
    pub status: AnalysisStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl AnalysisRequest {
    pub async fn create(
        db: &PgPool,
        created_by: Uuid,
        file_name: &str,
        file_url: Option<&str>,
        analysis_summary: Option<&str>,
    ) -> Result<AnalysisRequest, ApiError> {
        let row = sqlx::query_as::<_, AnalysisRequest>(
            r#"
            INSERT INTO analysis_requests (created_by, file_name, file_url, analysis_summary)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_by, file_name, file_url, analysis_summary, status, created_at
            "#,
        )
        .bind(created_by)
        .bind(file_name)
        .bind(file_url)
        .bind(analysis_summary)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn list_by_owner(
        db: &PgPool,
        owner: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AnalysisRequest>, ApiError> {
        let rows = sqlx::query_as::<_, AnalysisRequest>(
            r#"
            SELECT id, created_by, file_name, file_url, analysis_summary, status, created_at
            FROM analysis_requests
            WHERE created_by = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<AnalysisRequest>, ApiError> {
        let row = sqlx::query_as::<_, AnalysisRequest>(
            r#"
            SELECT id, created_by, file_name, file_url, analysis_summary, status, created_at
            FROM analysis_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        analysis_summary: Option<&str>,
        status: Option<AnalysisStatus>,
    ) -> Result<AnalysisRequest, ApiError> {
        let row = sqlx::query_as::<_, AnalysisRequest>(
            r#"
            UPDATE analysis_requests
            SET analysis_summary = COALESCE($2, analysis_summary),
                status = COALESCE($3, status)
            WHERE id = $1
            RETURNING id, created_by, file_name, file_url, analysis_summary, status, created_at
            "#,
        )
        .bind(id)
        .bind(analysis_summary)
        .bind(status)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}
