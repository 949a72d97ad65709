use sqlx::{postgres::PgPoolOptions, PgPool};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Credential roles the API connects with.
///
/// `App` is the row-level-restricted application credential. `Service` is
/// the elevated credential required by privileged paths (reading another
/// user's profile row during impersonation start, tenant provisioning).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Credential {
    App,
    Service,
}

impl Credential {
    fn name(self) -> &'static str {
        match self {
            Credential::App => "app",
            Credential::Service => "service",
        }
    }
}

/// Centralized connection pool manager for the app and service credentials
pub struct DatabaseManager {
    pools: Arc<RwLock<HashMap<Credential, PgPool>>>,
}

impl DatabaseManager {
    fn instance() -> &'static DatabaseManager {
        use std::sync::OnceLock;
        static INSTANCE: OnceLock<DatabaseManager> = OnceLock::new();
        INSTANCE.get_or_init(|| DatabaseManager {
            pools: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Pool connected with the application credential (DATABASE_URL)
    pub async fn app_pool() -> Result<PgPool, DatabaseError> {
        Self::instance().get_pool(Credential::App).await
    }

    /// Pool connected with the elevated service credential (SERVICE_DATABASE_URL)
    pub async fn service_pool() -> Result<PgPool, DatabaseError> {
        Self::instance().get_pool(Credential::Service).await
    }

    /// Get existing pool or create a new one lazily
    async fn get_pool(&self, credential: Credential) -> Result<PgPool, DatabaseError> {
        // Fast path: try read lock
        {
            let pools = self.pools.read().await;
            if let Some(pool) = pools.get(&credential) {
                return Ok(pool.clone());
            }
        }

        let connection_string = Self::connection_url(credential)?;
        let db_config = &config::config().database;

        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .acquire_timeout(Duration::from_secs(db_config.connection_timeout))
            .connect(&connection_string)
            .await?;

        // Store in cache
        {
            let mut pools = self.pools.write().await;
            pools.insert(credential, pool.clone());
        }

        info!("Created database pool for credential: {}", credential.name());
        Ok(pool)
    }

    fn connection_url(credential: Credential) -> Result<String, DatabaseError> {
        let raw = match credential {
            Credential::App => std::env::var("DATABASE_URL")
                .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?,
            Credential::Service => match std::env::var("SERVICE_DATABASE_URL") {
                Ok(url) => url,
                Err(_) => {
                    warn!(
                        "SERVICE_DATABASE_URL not set; falling back to DATABASE_URL for \
                         privileged reads"
                    );
                    std::env::var("DATABASE_URL")
                        .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?
                }
            },
        };

        // Validate early so a typo fails at startup, not mid-request
        url::Url::parse(&raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        Ok(raw)
    }

    /// Pings the app pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::app_pool().await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Apply pending migrations using the elevated credential
    pub async fn migrate() -> Result<(), DatabaseError> {
        let pool = Self::service_pool().await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        info!("Database migrations up to date");
        Ok(())
    }
}
