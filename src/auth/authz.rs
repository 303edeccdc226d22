use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::error::ApiError;

/// Account role, stored in the `user_role` Postgres enum and carried in
/// token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Owner-or-admin check. Pure comparison on already-fetched data; callers
/// fetch the resource first (404 if absent) and gate every read and write
/// on this.
pub fn ensure_owner(user: &AuthUser, owner: Uuid) -> Result<(), ApiError> {
    if user.id == owner || user.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn owner_is_authorized() {
        let user = subject(Role::User);
        assert!(ensure_owner(&user, user.id).is_ok());
    }

    #[test]
    fn non_owner_is_forbidden() {
        let user = subject(Role::User);
        let err = ensure_owner(&user, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[test]
    fn admin_bypasses_ownership() {
        let admin = subject(Role::Admin);
        assert!(ensure_owner(&admin, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn mismatch_is_forbidden_for_any_owner() {
        // The check depends only on the identifiers, not on what kind of
        // resource the owner id came from.
        let user = subject(Role::User);
        for _ in 0..16 {
            assert!(ensure_owner(&user, Uuid::new_v4()).is_err());
        }
    }
}
