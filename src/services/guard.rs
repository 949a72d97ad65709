//! Authorization guard for administrator-only operations.
//!
//! Called inline at the point of use, before any mutation, regardless of
//! route-level protection upstream.

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{Role, UserRole};

/// The verified administrator on whose behalf a privileged operation runs.
#[derive(Debug, Clone, Copy)]
pub struct AdminActor {
    pub id: Uuid,
}

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("User not found")]
    UserNotFound,

    #[error("Only admins can perform this action")]
    NotAdmin,

    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Look up the caller's stored role.
pub async fn fetch_role(pool: &PgPool, user_id: Uuid) -> Result<Option<Role>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRole>(
        "SELECT id, role, updated_at, updated_by FROM user_roles WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Role::parse(&r.role)))
}

/// Verify the caller holds the admin capability.
///
/// `caller_id` must come from a trusted session lookup, never from client
/// input. No side effects.
pub async fn admin_guard(pool: &PgPool, caller_id: Uuid) -> Result<AdminActor, GuardError> {
    let role = fetch_role(pool, caller_id)
        .await?
        .ok_or(GuardError::UserNotFound)?;

    if role != Role::Admin {
        tracing::warn!(
            caller_id = %caller_id,
            role = %role,
            "Admin capability check failed"
        );
        return Err(GuardError::NotAdmin);
    }

    Ok(AdminActor { id: caller_id })
}
