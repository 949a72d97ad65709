//! Impersonation lifecycle scenarios against a real PostgreSQL store.
//!
//! These run with `cargo test -- --ignored` and expect DATABASE_URL (and
//! optionally SERVICE_DATABASE_URL) to point at a database the test role
//! may create tables in. Migrations are applied on first use.

mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use reqwest::StatusCode;
use sqlx::PgPool;
use uuid::Uuid;
use vantage_api::database::manager::DatabaseManager;
use vantage_api::services::guard::{admin_guard, GuardError};
use vantage_api::services::impersonation::{ImpersonationError, ImpersonationService};

async fn setup_pool() -> Result<PgPool> {
    DatabaseManager::migrate().await?;
    Ok(DatabaseManager::service_pool().await?)
}

async fn seed_user(pool: &PgPool, role: &str) -> Result<Uuid> {
    let email = format!("{role}-{}@example.com", Uuid::new_v4().simple());
    let id: Uuid = sqlx::query_scalar("INSERT INTO profiles (email) VALUES ($1) RETURNING id")
        .bind(&email)
        .fetch_one(pool)
        .await?;
    sqlx::query("INSERT INTO user_roles (id, role) VALUES ($1, $2)")
        .bind(id)
        .bind(role)
        .execute(pool)
        .await?;
    Ok(id)
}

async fn session_count_for_admin(pool: &PgPool, admin_id: Uuid) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM impersonation_sessions WHERE admin_id = $1")
            .bind(admin_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn scenario_a_start_resolves_both_identities() -> Result<()> {
    let pool = setup_pool().await?;
    let admin = seed_user(&pool, "admin").await?;
    let target = seed_user(&pool, "user").await?;
    let service = ImpersonationService::new().await?;

    let session = service.start(admin, target).await?;

    assert_eq!(session.admin_id, admin);
    assert_eq!(session.impersonated_id, target);
    assert!(session.admin_email.starts_with("admin-"));
    assert!(session.user_email.starts_with("user-"));
    assert_eq!(session.user_role, "user");
    assert_eq!(session.expires_at - session.created_at, Duration::seconds(3600));

    // An immediate resolve in the same flow returns the identities passed
    // to start
    let resolved = service
        .resolve(Some(&session.id.to_string()), Utc::now())
        .await?
        .expect("session should be active");
    assert_eq!(resolved.admin_id, admin);
    assert_eq!(resolved.impersonated_id, target);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn scenario_b_non_admin_start_is_rejected_without_a_row() -> Result<()> {
    let pool = setup_pool().await?;
    let caller = seed_user(&pool, "user").await?;
    let target = seed_user(&pool, "user").await?;
    let service = ImpersonationService::new().await?;

    match service.start(caller, target).await {
        Err(ImpersonationError::Unauthorized(reason)) => {
            assert_eq!(reason, "Only admins can perform this action");
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }

    assert_eq!(session_count_for_admin(&pool, caller).await?, 0);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn unknown_caller_is_rejected_with_a_distinct_reason() -> Result<()> {
    let pool = setup_pool().await?;
    let target = seed_user(&pool, "user").await?;
    let service = ImpersonationService::new().await?;

    match service.start(Uuid::new_v4(), target).await {
        Err(ImpersonationError::Unauthorized(reason)) => {
            assert_eq!(reason, "User not found");
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn scenario_c_expiry_is_enforced_at_read_time() -> Result<()> {
    let pool = setup_pool().await?;
    let admin = seed_user(&pool, "admin").await?;
    let target = seed_user(&pool, "user").await?;
    let service = ImpersonationService::new().await?;

    let created_at = Utc::now();
    let expires_at = created_at + Duration::seconds(3600);
    let session_id: Uuid = sqlx::query_scalar(
        "INSERT INTO impersonation_sessions (admin_id, impersonated_id, created_at, expires_at) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(admin)
    .bind(target)
    .bind(created_at)
    .bind(expires_at)
    .fetch_one(&pool)
    .await?;

    let pointer = session_id.to_string();

    // One second before expiry the session resolves
    let resolved = service
        .resolve(Some(&pointer), created_at + Duration::seconds(3599))
        .await?;
    assert!(resolved.is_some());

    // One second after expiry it reads as "no active session"
    let resolved = service
        .resolve(Some(&pointer), created_at + Duration::seconds(3601))
        .await?;
    assert!(resolved.is_none());

    // The row itself is still there; expiry is a filter, not a delete
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM impersonation_sessions WHERE id = $1)")
            .bind(session_id)
            .fetch_one(&pool)
            .await?;
    assert!(exists);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn scenario_d_stop_is_idempotent() -> Result<()> {
    let pool = setup_pool().await?;
    let admin = seed_user(&pool, "admin").await?;
    let target = seed_user(&pool, "user").await?;
    let service = ImpersonationService::new().await?;

    let session = service.start(admin, target).await?;
    let pointer = session.id.to_string();

    service.stop(Some(&pointer)).await?;
    assert!(service.resolve(Some(&pointer), Utc::now()).await?.is_none());

    // Stopping again, with no pointer, or with garbage never errors
    service.stop(Some(&pointer)).await?;
    service.stop(None).await?;
    service.stop(Some("not-a-session-id")).await?;

    assert_eq!(session_count_for_admin(&pool, admin).await?, 0);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn scenario_e_self_impersonation_is_rejected() -> Result<()> {
    // The upstream gap is closed deliberately: targeting yourself fails
    // instead of creating a degenerate session
    let pool = setup_pool().await?;
    let admin = seed_user(&pool, "admin").await?;
    let service = ImpersonationService::new().await?;

    match service.start(admin, admin).await {
        Err(ImpersonationError::SelfImpersonation) => {}
        other => panic!("expected SelfImpersonation, got {other:?}"),
    }

    assert_eq!(session_count_for_admin(&pool, admin).await?, 0);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn nonexistent_target_is_rejected_without_a_row() -> Result<()> {
    let pool = setup_pool().await?;
    let admin = seed_user(&pool, "admin").await?;
    let service = ImpersonationService::new().await?;

    match service.start(admin, Uuid::new_v4()).await {
        Err(ImpersonationError::TargetNotFound) => {}
        other => panic!("expected TargetNotFound, got {other:?}"),
    }

    assert_eq!(session_count_for_admin(&pool, admin).await?, 0);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn forged_pointers_resolve_to_nothing() -> Result<()> {
    let _pool = setup_pool().await?;
    let service = ImpersonationService::new().await?;
    let now = Utc::now();

    // A well-formed but unknown id and outright garbage behave the same
    let unknown = Uuid::new_v4().to_string();
    assert!(service.resolve(Some(&unknown), now).await?.is_none());
    assert!(!service.is_active(&unknown, now).await?);

    assert!(service.resolve(Some("garbage"), now).await?.is_none());
    assert!(!service.is_active("garbage", now).await?);

    assert!(service.resolve(None, now).await?.is_none());
    Ok(())
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn guard_distinguishes_missing_user_from_non_admin() -> Result<()> {
    let pool = setup_pool().await?;
    let user = seed_user(&pool, "user").await?;

    match admin_guard(&pool, Uuid::new_v4()).await {
        Err(GuardError::UserNotFound) => {}
        other => panic!("expected UserNotFound, got {other:?}"),
    }

    match admin_guard(&pool, user).await {
        Err(GuardError::NotAdmin) => {}
        other => panic!("expected NotAdmin, got {other:?}"),
    }

    let admin = seed_user(&pool, "admin").await?;
    let actor = admin_guard(&pool, admin).await?;
    assert_eq!(actor.id, admin);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn p4_admin_area_is_blocked_while_impersonating() -> Result<()> {
    let pool = setup_pool().await?;
    let server = common::ensure_server().await?;
    let client = common::no_redirect_client();

    let admin = seed_user(&pool, "admin").await?;
    let target = seed_user(&pool, "user").await?;
    let service = ImpersonationService::new().await?;
    let session = service.start(admin, target).await?;

    // With an active session, admin-area navigation bounces to the
    // dashboard before any auth/role handling runs
    let res = client
        .get(format!("{}/admin/dashboard", server.base_url))
        .header("cookie", format!("impersonation_id={}", session.id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()["location"], "/dashboard");

    // Non-admin paths pass through the gate untouched
    let res = client
        .get(format!("{}/dashboard", server.base_url))
        .header("cookie", format!("impersonation_id={}", session.id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // After stop, the same request is governed by the caller's real
    // session again (here: none, so the sign-in redirect)
    service.stop(Some(&session.id.to_string())).await?;
    let res = client
        .get(format!("{}/admin/dashboard", server.base_url))
        .header("cookie", format!("impersonation_id={}", session.id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()["location"], "/sign-in");
    Ok(())
}
