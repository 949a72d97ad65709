//! Presence surface for the impersonation banner.
//!
//! The banner polls `GET /api/impersonation` (interval advertised in the
//! response) and exits via the stop endpoints. Both reads and stops are
//! safe to repeat: resolve is side-effect-free and stop is idempotent.

use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::config;
use crate::error::ApiError;
use crate::handlers::encoded_redirect;
use crate::middleware::{ApiResponse, ApiResult};
use crate::routes;
use crate::services::impersonation::{
    clear_pointer_cookie, ImpersonationService, POINTER_COOKIE,
};

#[derive(Debug, Serialize)]
pub struct PresenceStatus {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Suggested client poll interval, seconds.
    pub poll_secs: u64,
}

/// GET /api/impersonation - resolve the caller's pointer to the active
/// session, if any
pub async fn status(jar: CookieJar) -> ApiResult<PresenceStatus> {
    let poll_secs = config::config().impersonation.presence_poll_secs;
    let pointer = jar.get(POINTER_COOKIE).map(|c| c.value().to_string());

    // No pointer means no session; skip the store entirely
    let session = match pointer {
        Some(pointer) => {
            let service = ImpersonationService::new().await?;
            service.resolve(Some(&pointer), Utc::now()).await?
        }
        None => None,
    };

    let status = match session {
        Some(session) => PresenceStatus {
            active: true,
            admin_email: Some(session.admin_email),
            user_email: Some(session.user_email),
            expires_at: Some(session.expires_at),
            poll_secs,
        },
        None => PresenceStatus {
            active: false,
            admin_email: None,
            user_email: None,
            expires_at: None,
            poll_secs,
        },
    };

    Ok(ApiResponse::success(status))
}

/// DELETE /api/impersonation - the banner's exit control
pub async fn stop(jar: CookieJar) -> Result<(CookieJar, ApiResponse<Value>), ApiError> {
    let jar = stop_session(jar).await?;
    Ok((jar, ApiResponse::success(json!({ "stopped": true }))))
}

/// POST /impersonation/stop - form flavor; returns the admin to user
/// management
pub async fn stop_and_return(jar: CookieJar) -> Result<(CookieJar, Redirect), ApiError> {
    let jar = stop_session(jar).await?;
    Ok((
        jar,
        encoded_redirect("success", routes::ADMIN_USERS, "Stopped impersonation"),
    ))
}

/// Shared stop flow: idempotent, and a no-op without a pointer.
async fn stop_session(jar: CookieJar) -> Result<CookieJar, ApiError> {
    let pointer = jar.get(POINTER_COOKIE).map(|c| c.value().to_string());

    if let Some(pointer) = pointer {
        let service = ImpersonationService::new().await?;
        service.stop(Some(&pointer)).await?;
    }

    Ok(jar.remove(clear_pointer_cookie()))
}
