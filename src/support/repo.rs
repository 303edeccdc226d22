use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    InProgress,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SupportTicket {
    pub id: Uuid,
    /// Owner. Written once at insert, never updated.
    pub created_by: Uuid,
    /// Owner's email at creation time, for the support inbox.
    pub user_email: String,
    pub request_type: String,
    pub details: String,
    pub status: TicketStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl SupportTicket {
    pub async fn create(
        db: &PgPool,
        created_by: Uuid,
        user_email: &str,
        request_type: &str,
        details: &str,
    ) -> Result<SupportTicket, ApiError> {
        let row = sqlx::query_as::<_, SupportTicket>(
            r#"
            INSERT INTO support_tickets (created_by, user_email, request_type, details)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_by, user_email, request_type, details, status, created_at
            "#,
        )
        .bind(created_by)
        .bind(user_email)
        .bind(request_type)
        .bind(details)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn list_by_owner(
        db: &PgPool,
        owner: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SupportTicket>, ApiError> {
        let rows = sqlx::query_as::<_, SupportTicket>(
            r#"
            SELECT id, created_by, user_email, request_type, details, status, created_at
            FROM support_tickets
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

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<SupportTicket>, ApiError> {
        let row = sqlx::query_as::<_, SupportTicket>(
            r#"
            SELECT id, created_by, user_email, request_type, details, status, created_at
            FROM support_tickets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn update_status(
        db: &PgPool,
        id: Uuid,
        status: TicketStatus,
    ) -> Result<SupportTicket, ApiError> {
        let row = sqlx::query_as::<_, SupportTicket>(
            r#"
            UPDATE support_tickets
            SET status = $2
            WHERE id = $1
            RETURNING id, created_by, user_email, request_type, details, status, created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}
