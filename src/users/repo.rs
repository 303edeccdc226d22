use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::authz::Role;
use crate::error::{is_unique_violation, ApiError};

/// User record as stored. The hash is skipped on serialization so a row
/// can never leak it even if returned directly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, full_name, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, full_name, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new account. The unique index on email is the only
    /// duplicate check; its violation surfaces as DuplicateEmail.
    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        full_name: &str,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, full_name)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, full_name, role, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(full_name)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::DuplicateEmail
            } else {
                e.into()
            }
        })?;
        Ok(user)
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        email: Option<&str>,
        full_name: Option<&str>,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                full_name = COALESCE($3, full_name)
            WHERE id = $1
            RETURNING id, email, password_hash, full_name, role, created_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(full_name)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::DuplicateEmail
            } else {
                e.into()
            }
        })?;
        Ok(user)
    }

    pub async fn update_password(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_never_includes_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            full_name: "Alice".into(),
            role: Role::User,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let value = serde_json::to_value(&user).expect("serialize");
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["email"], "alice@example.com");
        assert_eq!(value["role"], "user");
    }
}
