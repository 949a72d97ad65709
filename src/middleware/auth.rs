use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::database::manager::DatabaseManager;
use crate::database::models::Role;
use crate::routes;
use crate::services::guard;

/// Name of the HTTP-only session cookie carrying the JWT.
pub const SESSION_COOKIE: &str = "vantage_session";

/// Authenticated user context, injected into request extensions for
/// downstream handlers.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Session middleware: validates the caller's token, refreshes the role
/// from the store, injects [`AuthUser`], and applies the role-routing
/// redirect rules for page navigation.
///
/// Runs after the impersonation gate. The gate must win on admin paths
/// while an impersonation is active, otherwise this middleware would
/// bounce an impersonating admin straight back into `/admin`.
pub async fn session_middleware(jar: CookieJar, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    let claims = extract_session_token(&jar, request.headers())
        .and_then(|token| auth::validate_jwt(&token).ok());

    let Some(claims) = claims else {
        if routes::is_admin_area(&path) || routes::is_protected_area(&path) {
            return Redirect::temporary(routes::SIGN_IN).into_response();
        }
        return next.run(request).await;
    };

    // Fresh role lookup: token claims can go stale between issuance and
    // use (role demotion must take effect on the next request).
    let role = match lookup_role(claims.sub).await {
        Ok(role) => role,
        Err(e) => {
            // Store outage: keep serving with the role carried in the
            // signed token and skip redirect routing. Inline guards on
            // privileged operations still re-check against the store.
            tracing::error!(user_id = %claims.sub, error = %e, "Role lookup failed");
            request.extensions_mut().insert(auth_user(&claims, Role::parse(&claims.role)));
            return next.run(request).await;
        }
    };

    if routes::is_admin_area(&path) && role != Role::Admin {
        tracing::warn!(
            user_id = %claims.sub,
            role = %role,
            path = %path,
            "Non-admin request to admin area"
        );
        return Redirect::temporary(routes::UNAUTHORIZED).into_response();
    }

    if routes::is_auth_page(&path) || path == "/" {
        return Redirect::temporary(routes::role_landing(role)).into_response();
    }

    request.extensions_mut().insert(auth_user(&claims, role));
    next.run(request).await
}

fn auth_user(claims: &Claims, role: Role) -> AuthUser {
    AuthUser {
        id: claims.sub,
        email: claims.email.clone(),
        role,
    }
}

/// Session token from the session cookie, or a Bearer header for API
/// clients.
fn extract_session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

async fn lookup_role(user_id: Uuid) -> Result<Role, Box<dyn std::error::Error + Send + Sync>> {
    let pool = DatabaseManager::app_pool().await?;
    // Missing role row degrades to guest, the least-privileged tier
    let role = guard::fetch_role(&pool, user_id).await?.unwrap_or(Role::Guest);
    Ok(role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_is_accepted() {
        let jar = CookieJar::new();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));

        assert_eq!(
            extract_session_token(&jar, &headers),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn empty_or_malformed_tokens_are_ignored() {
        let jar = CookieJar::new();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(extract_session_token(&jar, &headers), None);

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_session_token(&jar, &headers), None);
    }
}
