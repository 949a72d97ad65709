//! Vantage API: multi-tenant SaaS administration backend.
//!
//! The interesting part is the impersonation subsystem: a time-boxed,
//! admin-initiated session overlay that lets an administrator view the
//! app as another user without holding their credentials. Everything
//! else is conventional auth/tenant/user plumbing around it.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(page_routes())
        .merge(auth_routes())
        .merge(admin_routes())
        .merge(impersonation_routes())
        // Session auth + role routing
        .layer(axum::middleware::from_fn(middleware::session_middleware))
        // The gate wraps the session layer: it must see admin-area
        // requests first, or the role router would send an impersonating
        // admin straight back into /admin
        .layer(axum::middleware::from_fn(middleware::impersonation_gate))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn page_routes() -> Router {
    use handlers::pages;

    Router::new()
        .route("/sign-in", get(pages::sign_in))
        .route("/sign-up", get(pages::sign_up))
        .route("/dashboard", get(pages::dashboard))
        .route("/protected", get(pages::protected))
        .route("/welcome", get(pages::welcome))
        .route("/unauthorized", get(pages::unauthorized))
        .route("/admin", get(pages::admin_home))
        .route("/admin/dashboard", get(pages::admin_dashboard))
}

fn auth_routes() -> Router {
    use handlers::auth;

    Router::new()
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/api/auth/whoami", get(auth::whoami))
}

fn admin_routes() -> Router {
    use handlers::admin;

    Router::new()
        .route("/admin/impersonate", post(admin::impersonate))
        .route("/admin/tenants", post(admin::create_tenant))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/role", post(admin::update_role))
}

fn impersonation_routes() -> Router {
    use handlers::impersonation;

    Router::new()
        .route(
            "/api/impersonation",
            get(impersonation::status).delete(impersonation::stop),
        )
        .route("/impersonation/stop", post(impersonation::stop_and_return))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Vantage API",
            "version": version,
            "description": "Multi-tenant SaaS administration API with admin impersonation",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/sign-in, /auth/sign-out (public - session acquisition)",
                "whoami": "/api/auth/whoami (protected)",
                "impersonation": "/api/impersonation (protected - presence + stop)",
                "admin": "/admin/* (admin capability required)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
