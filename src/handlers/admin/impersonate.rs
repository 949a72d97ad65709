//! Admin-initiated impersonation start.

use axum::extract::{Extension, Form};
use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::encoded_redirect;
use crate::middleware::AuthUser;
use crate::routes;
use crate::services::impersonation::{pointer_cookie, ImpersonationError, ImpersonationService};

#[derive(Debug, Deserialize)]
pub struct ImpersonateRequest {
    pub user_id: Uuid,
}

/// POST /admin/impersonate - start viewing the app as another user.
///
/// Success sets the pointer cookie and lands on the impersonated user's
/// dashboard; failure returns to user management with an inline error and
/// never sets a cookie.
pub async fn impersonate(
    user: Option<Extension<AuthUser>>,
    jar: CookieJar,
    Form(req): Form<ImpersonateRequest>,
) -> (CookieJar, Redirect) {
    let Some(Extension(user)) = user else {
        return (
            jar,
            encoded_redirect("error", routes::ADMIN_USERS, "Not authenticated"),
        );
    };

    let service = match ImpersonationService::new().await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "Impersonation service unavailable");
            return (
                jar,
                encoded_redirect("error", routes::ADMIN_USERS, "Failed to impersonate user"),
            );
        }
    };

    match service.start(user.id, req.user_id).await {
        Ok(session) => {
            let message = format!("Now viewing as {}", session.user_email);
            let jar = jar.add(pointer_cookie(session.id));
            (jar, encoded_redirect("success", routes::DASHBOARD, &message))
        }
        Err(e) => {
            tracing::warn!(
                admin_id = %user.id,
                target_user_id = %req.user_id,
                error = %e,
                "Failed to start impersonation"
            );
            (
                jar,
                encoded_redirect("error", routes::ADMIN_USERS, user_message(&e)),
            )
        }
    }
}

/// Client-facing failure text. Store internals stay in the logs.
fn user_message(err: &ImpersonationError) -> &str {
    match err {
        ImpersonationError::Unauthenticated => "Not authenticated",
        ImpersonationError::Unauthorized(reason) => reason,
        ImpersonationError::TargetNotFound => "Target user not found",
        ImpersonationError::SelfImpersonation => "Cannot impersonate yourself",
        ImpersonationError::CreationFailed
        | ImpersonationError::Database(_)
        | ImpersonationError::DatabaseManager(_) => "Failed to impersonate user",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_do_not_leak_details() {
        let err = ImpersonationError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(user_message(&err), "Failed to impersonate user");

        let err = ImpersonationError::Unauthorized("Only admins can perform this action".into());
        assert_eq!(user_message(&err), "Only admins can perform this action");
    }
}
