//! Tenant provisioning.
//!
//! Thin by design: the only business rules here are the uniqueness and
//! ownership checks tied to creation. The designated admin must be an
//! existing unassigned `user` profile; after the tenant row is created
//! that profile is pointed at it, and the tenant row is removed again if
//! the assignment fails.

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Role, Tenant};
use crate::services::guard::{self, GuardError};

#[derive(Debug, Error)]
pub enum TenantError {
    #[error("A tenant with this name or domain already exists")]
    AlreadyExists(String),

    #[error("Invalid tenant name: {0}")]
    InvalidName(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Selected admin profile not found")]
    AdminProfileNotFound,

    #[error("{0}")]
    AdminNotEligible(String),

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
}

pub struct TenantService {
    app_pool: PgPool,
    service_pool: PgPool,
}

impl TenantService {
    pub async fn new() -> Result<Self, TenantError> {
        Ok(Self {
            app_pool: DatabaseManager::app_pool().await?,
            service_pool: DatabaseManager::service_pool().await?,
        })
    }

    /// Create a new tenant and assign `admin_id` as its owning profile.
    pub async fn create_tenant(
        &self,
        caller_id: Uuid,
        name: &str,
        domain: &str,
        admin_id: Uuid,
    ) -> Result<Tenant, TenantError> {
        validate_tenant_name(name)?;
        let domain = normalize_domain(domain)?;

        guard::admin_guard(&self.app_pool, caller_id).await?;

        // Uniqueness across both name and domain
        let existing: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM tenants WHERE name = $1 OR domain = $2")
                .bind(name)
                .bind(&domain)
                .fetch_optional(&self.service_pool)
                .await?;

        if existing.is_some() {
            return Err(TenantError::AlreadyExists(name.to_string()));
        }

        // Ownership checks: the designated admin must exist, hold the
        // `user` role, and not already belong to a tenant.
        let profile: Option<(Uuid, Option<String>, Option<Uuid>)> = sqlx::query_as(
            r#"
            SELECT p.id, r.role, p.tenant_id
            FROM profiles p
            LEFT JOIN user_roles r ON r.id = p.id
            WHERE p.id = $1
            "#,
        )
        .bind(admin_id)
        .fetch_optional(&self.service_pool)
        .await?;

        let (_, role, tenant_id) = profile.ok_or(TenantError::AdminProfileNotFound)?;

        let role = role.as_deref().map(Role::parse).unwrap_or(Role::Guest);
        if role != Role::User {
            return Err(TenantError::AdminNotEligible(
                "Selected profile must be a user".to_string(),
            ));
        }
        if tenant_id.is_some() {
            return Err(TenantError::AdminNotEligible(
                "Selected user is already assigned to a tenant".to_string(),
            ));
        }

        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, domain, admin_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, domain, admin_id, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(&domain)
        .bind(admin_id)
        .fetch_one(&self.service_pool)
        .await?;

        let assigned = sqlx::query("UPDATE profiles SET tenant_id = $1, updated_at = now() WHERE id = $2")
            .bind(tenant.id)
            .bind(admin_id)
            .execute(&self.service_pool)
            .await;

        if let Err(e) = assigned {
            // Compensating cleanup: a tenant without its admin assignment
            // is unusable, so remove the row we just created.
            tracing::error!(
                tenant_id = %tenant.id,
                admin_id = %admin_id,
                error = %e,
                "Admin profile assignment failed; removing created tenant"
            );
            sqlx::query("DELETE FROM tenants WHERE id = $1")
                .bind(tenant.id)
                .execute(&self.service_pool)
                .await?;
            return Err(TenantError::Database(e));
        }

        tracing::info!(
            tenant_id = %tenant.id,
            name = %tenant.name,
            domain = %tenant.domain,
            admin_id = %admin_id,
            "Tenant created"
        );

        Ok(tenant)
    }
}

/// Validate tenant name follows rules
fn validate_tenant_name(name: &str) -> Result<(), TenantError> {
    if name.trim().is_empty() || name.len() < 2 {
        return Err(TenantError::InvalidName(
            "Tenant name must be at least 2 characters".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(TenantError::InvalidName(
            "Tenant name must be less than 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Lowercase and validate a domain name (labels of letters, digits and
/// hyphens, separated by dots).
fn normalize_domain(domain: &str) -> Result<String, TenantError> {
    let domain = domain.trim().to_lowercase();

    let valid = !domain.is_empty()
        && domain.len() <= 253
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                && !label.starts_with('-')
                && !label.ends_with('-')
        });

    if !valid {
        return Err(TenantError::InvalidDomain(format!(
            "Please enter a valid domain name (e.g. example.com), got '{domain}'"
        )));
    }

    Ok(domain)
}
