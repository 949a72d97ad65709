// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        use crate::database::manager::DatabaseError;
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::ConfigMissing(var) => {
                tracing::error!("Missing database configuration: {}", var);
                ApiError::service_unavailable("Database not configured")
            }
            DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Invalid database URL");
                ApiError::service_unavailable("Database not configured")
            }
            DatabaseError::Migration(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<crate::services::guard::GuardError> for ApiError {
    fn from(err: crate::services::guard::GuardError) -> Self {
        use crate::services::guard::GuardError;
        match err {
            GuardError::UserNotFound | GuardError::NotAdmin => ApiError::forbidden(err.to_string()),
            GuardError::Store(e) => {
                tracing::error!("Guard role lookup failed: {}", e);
                ApiError::internal_server_error("Failed to verify permissions")
            }
        }
    }
}

impl From<crate::services::impersonation::ImpersonationError> for ApiError {
    fn from(err: crate::services::impersonation::ImpersonationError) -> Self {
        use crate::services::impersonation::ImpersonationError;
        match err {
            ImpersonationError::Unauthenticated => ApiError::unauthorized("Not authenticated"),
            ImpersonationError::Unauthorized(reason) => ApiError::forbidden(reason),
            ImpersonationError::TargetNotFound => ApiError::not_found("Target user not found"),
            ImpersonationError::SelfImpersonation => {
                ApiError::bad_request("Cannot impersonate yourself")
            }
            ImpersonationError::CreationFailed => {
                ApiError::internal_server_error("Failed to create impersonation session")
            }
            ImpersonationError::Database(e) => {
                tracing::error!("Impersonation store error: {}", e);
                ApiError::service_unavailable("Impersonation store temporarily unavailable")
            }
            ImpersonationError::DatabaseManager(e) => e.into(),
        }
    }
}

impl From<crate::services::tenant::TenantError> for ApiError {
    fn from(err: crate::services::tenant::TenantError) -> Self {
        use crate::services::tenant::TenantError;
        match err {
            TenantError::AlreadyExists(_) => ApiError::conflict(err.to_string()),
            TenantError::InvalidName(_) | TenantError::InvalidDomain(_) => {
                ApiError::bad_request(err.to_string())
            }
            TenantError::AdminProfileNotFound => ApiError::not_found(err.to_string()),
            TenantError::AdminNotEligible(_) => ApiError::bad_request(err.to_string()),
            TenantError::Guard(e) => e.into(),
            TenantError::Database(e) => {
                tracing::error!("Tenant store error: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            TenantError::DatabaseManager(e) => e.into(),
        }
    }
}

impl From<crate::auth::JwtError> for ApiError {
    fn from(err: crate::auth::JwtError) -> Self {
        tracing::error!("JWT error: {}", err);
        ApiError::internal_server_error("Failed to issue session token")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
