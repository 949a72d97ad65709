//! Impersonation session lifecycle: start, resolve, stop.
//!
//! The client-held pointer (cookie value) is always passed in explicitly;
//! nothing in here reaches into ambient request state. A pointer confers
//! no authority on its own: every read re-validates existence and expiry
//! against the store.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{ActiveImpersonation, ImpersonationSession};
use crate::services::guard::{self, GuardError};

/// Name of the client-visible pointer cookie.
pub const POINTER_COOKIE: &str = "impersonation_id";

#[derive(Debug, Error)]
pub enum ImpersonationError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Target user not found")]
    TargetNotFound,

    #[error("Cannot impersonate yourself")]
    SelfImpersonation,

    #[error("Failed to create impersonation session")]
    CreationFailed,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
}

const ENRICHED_SELECT: &str = r#"
    SELECT
        s.id, s.admin_id, s.impersonated_id,
        a.email AS admin_email,
        i.email AS user_email,
        COALESCE(r.role, 'guest') AS user_role,
        s.created_at, s.expires_at
    FROM impersonation_sessions s
    JOIN profiles a ON a.id = s.admin_id
    JOIN profiles i ON i.id = s.impersonated_id
    LEFT JOIN user_roles r ON r.id = s.impersonated_id
"#;

pub struct ImpersonationService {
    app_pool: PgPool,
    service_pool: PgPool,
}

impl ImpersonationService {
    pub async fn new() -> Result<Self, DatabaseError> {
        Ok(Self {
            app_pool: DatabaseManager::app_pool().await?,
            service_pool: DatabaseManager::service_pool().await?,
        })
    }

    /// Start impersonating `target_user_id` on behalf of `caller_id`.
    ///
    /// The admin capability is re-checked inline here even when the route
    /// is admin-protected upstream. Insert and enrichment run in one
    /// transaction: if the joined read cannot resolve both emails the
    /// whole operation rolls back and no row is left behind.
    pub async fn start(
        &self,
        caller_id: Uuid,
        target_user_id: Uuid,
    ) -> Result<ActiveImpersonation, ImpersonationError> {
        let actor = guard::admin_guard(&self.app_pool, caller_id)
            .await
            .map_err(|e| match e {
                GuardError::Store(err) => ImpersonationError::Database(err),
                reason => ImpersonationError::Unauthorized(reason.to_string()),
            })?;

        if target_user_id == actor.id {
            tracing::warn!(
                admin_id = %actor.id,
                "Impersonation rejected: cannot impersonate self"
            );
            return Err(ImpersonationError::SelfImpersonation);
        }

        // Elevated read: the target's profile row may be shielded from the
        // app credential by row-level policies.
        let target: Option<Uuid> = sqlx::query_scalar("SELECT id FROM profiles WHERE id = $1")
            .bind(target_user_id)
            .fetch_optional(&self.service_pool)
            .await?;

        if target.is_none() {
            tracing::warn!(
                admin_id = %actor.id,
                target_user_id = %target_user_id,
                "Impersonation rejected: target user not found"
            );
            return Err(ImpersonationError::TargetNotFound);
        }

        let now = Utc::now();
        let ttl = config::config().impersonation.ttl_secs;
        let expires_at = now + Duration::seconds(ttl as i64);

        let mut tx = self.service_pool.begin().await?;

        let session_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO impersonation_sessions (admin_id, impersonated_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(actor.id)
        .bind(target_user_id)
        .bind(now)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        let enriched = sqlx::query_as::<_, ActiveImpersonation>(&format!(
            "{ENRICHED_SELECT} WHERE s.id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?;

        match enriched {
            Some(session) => {
                tx.commit().await?;
                tracing::info!(
                    session_id = %session.id,
                    admin_id = %session.admin_id,
                    impersonated_id = %session.impersonated_id,
                    expires_at = %session.expires_at,
                    "Impersonation session started"
                );
                Ok(session)
            }
            None => {
                tx.rollback().await?;
                tracing::error!(
                    session_id = %session_id,
                    "Impersonation session insert could not be enriched; rolled back"
                );
                Err(ImpersonationError::CreationFailed)
            }
        }
    }

    /// Resolve the active session named by `pointer`, if any.
    ///
    /// Absent, unparseable, unknown, or expired pointers all resolve to
    /// `None`, never an error, and the stale pointer is not cleared here.
    /// Read-only, so it is safe on hot request paths and from polling UI.
    pub async fn resolve(
        &self,
        pointer: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<ActiveImpersonation>, ImpersonationError> {
        let Some(session_id) = pointer.and_then(parse_pointer) else {
            return Ok(None);
        };

        let session = sqlx::query_as::<_, ActiveImpersonation>(&format!(
            "{ENRICHED_SELECT} WHERE s.id = $1 AND s.expires_at > $2"
        ))
        .bind(session_id)
        .bind(now)
        .fetch_optional(&self.service_pool)
        .await?;

        Ok(session)
    }

    /// Lightweight existence + expiry check for the request gate.
    ///
    /// Skips the enrichment join; the gate only needs to know whether an
    /// active session exists.
    pub async fn is_active(
        &self,
        pointer: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ImpersonationError> {
        let Some(session_id) = parse_pointer(pointer) else {
            return Ok(false);
        };

        let expires_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT expires_at FROM impersonation_sessions WHERE id = $1")
                .bind(session_id)
                .fetch_optional(&self.service_pool)
                .await?;

        Ok(expires_at
            .map(|expires_at| ImpersonationSession::is_current(expires_at, now))
            .unwrap_or(false))
    }

    /// End the session named by `pointer`. Idempotent: a missing pointer,
    /// a garbage pointer, or an already-deleted row are all success.
    pub async fn stop(&self, pointer: Option<&str>) -> Result<(), ImpersonationError> {
        let Some(session_id) = pointer.and_then(parse_pointer) else {
            return Ok(());
        };

        let result = sqlx::query("DELETE FROM impersonation_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.service_pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::info!(session_id = %session_id, "Impersonation session stopped");
        }

        Ok(())
    }
}

/// Parse a raw pointer value. Anything that is not a UUID is treated as
/// "no session", never as an error. A forged cookie must not leak
/// whether any session exists.
pub fn parse_pointer(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Build the client-visible pointer cookie for a new session.
///
/// Deliberately not HTTP-only: the presence banner reads it client-side.
/// It is a weak reference either way; the server re-validates on every
/// read.
pub fn pointer_cookie(session_id: Uuid) -> Cookie<'static> {
    let cfg = config::config();
    Cookie::build((POINTER_COOKIE, session_id.to_string()))
        .http_only(false)
        .secure(cfg.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(cfg.impersonation.ttl_secs as i64))
        .path("/")
        .build()
}

/// A cookie that clears the pointer on the client.
pub fn clear_pointer_cookie() -> Cookie<'static> {
    Cookie::build((POINTER_COOKIE, "")).path("/").build()
}
