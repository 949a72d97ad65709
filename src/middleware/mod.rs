pub mod auth;
pub mod impersonation;
pub mod response;

pub use auth::{session_middleware, AuthUser, SESSION_COOKIE};
pub use impersonation::impersonation_gate;
pub use response::{ApiResponse, ApiResult};
