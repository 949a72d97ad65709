//! Tenant provisioning form action.

use axum::extract::{Extension, Form};
use axum::response::Redirect;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::encoded_redirect;
use crate::middleware::AuthUser;
use crate::routes;
use crate::services::tenant::{TenantError, TenantService};

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    pub domain: String,
    pub admin_id: Uuid,
}

/// POST /admin/tenants - create a tenant and assign its admin profile
pub async fn create_tenant(
    user: Option<Extension<AuthUser>>,
    Form(req): Form<CreateTenantRequest>,
) -> Redirect {
    let Some(Extension(user)) = user else {
        return encoded_redirect("error", routes::ADMIN_TENANTS, "Not authenticated");
    };

    let service = match TenantService::new().await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "Tenant service unavailable");
            return encoded_redirect("error", routes::ADMIN_TENANTS, "Failed to create tenant");
        }
    };

    match service
        .create_tenant(user.id, &req.name, &req.domain, req.admin_id)
        .await
    {
        Ok(tenant) => {
            tracing::info!(tenant_id = %tenant.id, created_by = %user.id, "Tenant created");
            encoded_redirect(
                "success",
                routes::ADMIN_TENANTS,
                "Tenant created successfully",
            )
        }
        Err(e) => {
            tracing::warn!(created_by = %user.id, error = %e, "Tenant creation failed");
            encoded_redirect("error", routes::ADMIN_TENANTS, &user_message(&e))
        }
    }
}

fn user_message(err: &TenantError) -> String {
    match err {
        TenantError::Database(_) | TenantError::DatabaseManager(_) => {
            "Failed to create tenant".to_string()
        }
        other => other.to_string(),
    }
}
