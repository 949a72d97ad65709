//! Credential sign-in, sign-out, and session introspection.

use axum::{
    extract::{Extension, Form},
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{self, password, Claims};
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::{Profile, Role};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, SESSION_COOKIE};
use crate::routes;
use crate::services::guard;
use crate::services::impersonation;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/sign-in - verify credentials, issue a session, land on the
/// caller's role page
pub async fn sign_in(
    jar: CookieJar,
    Form(req): Form<SignInRequest>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let pool = DatabaseManager::app_pool().await?;
    let email = req.email.trim().to_lowercase();

    let profile = sqlx::query_as::<_, Profile>(
        "SELECT id, email, password_hash, tenant_id, metadata, created_at, updated_at \
         FROM profiles WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Sign-in profile lookup failed: {}", e);
        ApiError::internal_server_error("Sign-in failed")
    })?;

    // One non-specific message for every credential failure
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let (profile, stored_hash) = match profile {
        Some(profile) => match profile.password_hash.clone() {
            Some(hash) => (profile, hash),
            None => {
                tracing::warn!(email = %email, "Sign-in failed: profile has no password set");
                return Err(invalid());
            }
        },
        None => {
            tracing::warn!(email = %email, "Sign-in failed: unknown email");
            return Err(invalid());
        }
    };

    if !password::verify_password(&req.password, &stored_hash) {
        tracing::warn!(user_id = %profile.id, "Sign-in failed: bad password");
        return Err(invalid());
    }

    let role = guard::fetch_role(&pool, profile.id)
        .await
        .map_err(|e| {
            tracing::error!(user_id = %profile.id, "Sign-in role lookup failed: {}", e);
            ApiError::internal_server_error("Sign-in failed")
        })?
        .unwrap_or(Role::Guest);

    let claims = Claims::new(profile.id, profile.email.clone(), role.as_str().to_string());
    let token = auth::generate_jwt(&claims)?;

    tracing::info!(user_id = %profile.id, role = %role, "User signed in");

    let jar = jar.add(session_cookie(token));
    Ok((jar, Redirect::to(routes::role_landing(role))))
}

/// POST /auth/sign-out - drop the session and any impersonation pointer
pub async fn sign_out(jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar
        .remove(Cookie::build((SESSION_COOKIE, "")).path("/").build())
        .remove(impersonation::clear_pointer_cookie());
    (jar, Redirect::to(routes::SIGN_IN))
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// GET /api/auth/whoami - current authenticated user
pub async fn whoami(user: Option<Extension<AuthUser>>) -> ApiResult<WhoAmI> {
    let Some(Extension(user)) = user else {
        return Err(ApiError::unauthorized("Not authenticated"));
    };

    Ok(ApiResponse::success(WhoAmI {
        id: user.id,
        email: user.email,
        role: user.role,
    }))
}

fn session_cookie(token: String) -> Cookie<'static> {
    let cfg = config::config();
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(cfg.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(cfg.security.jwt_expiry_hours as i64))
        .path("/")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = session_cookie("token".into());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }
}
