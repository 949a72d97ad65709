//! User listing and role management for the admin area.

use axum::extract::{Extension, Form};
use axum::response::Redirect;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::handlers::encoded_redirect;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::routes;
use crate::services::guard;

#[derive(Debug, Serialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub tenant_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// GET /admin/users - profiles with roles, feeding the user table and the
/// impersonation picker
pub async fn list_users(user: Option<Extension<AuthUser>>) -> ApiResult<Vec<UserSummary>> {
    let Some(Extension(user)) = user else {
        return Err(ApiError::unauthorized("Not authenticated"));
    };

    let app_pool = DatabaseManager::app_pool().await?;
    guard::admin_guard(&app_pool, user.id).await?;

    // Elevated read: listing spans profiles the app credential cannot see
    let service_pool = DatabaseManager::service_pool().await?;
    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT p.id, p.email, COALESCE(r.role, 'guest') AS role, p.tenant_id, p.created_at
        FROM profiles p
        LEFT JOIN user_roles r ON r.id = p.id
        ORDER BY p.created_at
        "#,
    )
    .fetch_all(&service_pool)
    .await
    .map_err(|e| {
        tracing::error!("User listing failed: {}", e);
        ApiError::internal_server_error("Failed to list users")
    })?;

    Ok(ApiResponse::success(users))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub user_id: Uuid,
    pub role: String,
}

/// POST /admin/users/role - change a user's role
pub async fn update_role(
    user: Option<Extension<AuthUser>>,
    Form(req): Form<UpdateRoleRequest>,
) -> Redirect {
    let Some(Extension(user)) = user else {
        return encoded_redirect("error", routes::ADMIN_USERS, "User not found");
    };

    if !matches!(req.role.as_str(), "admin" | "user" | "guest") {
        return encoded_redirect("error", routes::ADMIN_USERS, "Invalid role");
    }

    let result = async {
        let app_pool = DatabaseManager::app_pool().await?;
        guard::admin_guard(&app_pool, user.id)
            .await
            .map_err(ApiError::from)?;

        let service_pool = DatabaseManager::service_pool().await?;
        let updated =
            sqlx::query("UPDATE user_roles SET role = $2, updated_at = now(), updated_by = $3 WHERE id = $1")
                .bind(req.user_id)
                .bind(&req.role)
                .bind(user.id)
                .execute(&service_pool)
                .await
                .map_err(|e| {
                    tracing::error!("Role update failed: {}", e);
                    ApiError::internal_server_error("Failed to update user role")
                })?;

        if updated.rows_affected() == 0 {
            return Err(ApiError::not_found("User not found"));
        }
        Ok::<_, ApiError>(())
    }
    .await;

    match result {
        Ok(()) => {
            tracing::info!(
                user_id = %req.user_id,
                role = %req.role,
                updated_by = %user.id,
                "User role updated"
            );
            encoded_redirect(
                "success",
                routes::ADMIN_USERS,
                "User role updated successfully",
            )
        }
        Err(e) => encoded_redirect("error", routes::ADMIN_USERS, e.message()),
    }
}
