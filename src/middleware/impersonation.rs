use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;

use crate::routes;
use crate::services::impersonation::{parse_pointer, ImpersonationService, POINTER_COOKIE};

/// Request gate: while an impersonation session is active, navigation into
/// the administrator area is redirected to the impersonated user's
/// dashboard.
///
/// This layer is the privilege-escalation barrier. The underlying session
/// token still carries admin authority, so the gate must run before the
/// role-routing middleware; otherwise the role router would send the
/// admin back into `/admin` and defeat the barrier.
///
/// On store failure the gate fails open to the *non-privileged* default:
/// the request proceeds as if no impersonation were active, and the role
/// check in the session middleware remains the actual gate for admin
/// access.
pub async fn impersonation_gate(jar: CookieJar, request: Request, next: Next) -> Response {
    let Some(pointer) = jar.get(POINTER_COOKIE).map(|c| c.value().to_string()) else {
        return next.run(request).await;
    };

    // A forged or mangled pointer can never name a session; skip the
    // store round trip on the hot path
    if parse_pointer(&pointer).is_none() {
        return next.run(request).await;
    }

    let service = match ImpersonationService::new().await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(
                error = %e,
                "Impersonation gate could not reach the store; treating as no active session"
            );
            return next.run(request).await;
        }
    };

    // The pointer is re-validated on every request; it confers nothing by
    // itself. Expired and forged pointers both read as inactive.
    let active = match service.is_active(&pointer, Utc::now()).await {
        Ok(active) => active,
        Err(e) => {
            tracing::error!(
                error = %e,
                "Impersonation gate check failed; treating as no active session"
            );
            false
        }
    };

    if active && routes::is_admin_area(request.uri().path()) {
        tracing::debug!(
            path = %request.uri().path(),
            "Active impersonation: redirecting away from admin area"
        );
        return Redirect::temporary(routes::DASHBOARD).into_response();
    }

    next.run(request).await
}
