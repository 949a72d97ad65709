//! Route classification and role-based landing pages.
//!
//! These are pure functions so the middleware decisions built on top of
//! them stay unit-testable without a request in hand.

use crate::database::models::Role;

pub const SIGN_IN: &str = "/sign-in";
pub const SIGN_UP: &str = "/sign-up";
pub const DASHBOARD: &str = "/dashboard";
pub const UNAUTHORIZED: &str = "/unauthorized";
pub const ADMIN_USERS: &str = "/admin/users";
pub const ADMIN_TENANTS: &str = "/admin/tenants";

/// Landing page for each role after sign-in or when hitting the root page.
pub fn role_landing(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin",
        Role::User => "/protected",
        Role::Guest => "/welcome",
    }
}

/// True for paths under the administrator-only area.
///
/// Matches on path segments, so `/administrator` is not an admin path.
pub fn is_admin_area(path: &str) -> bool {
    path == "/admin" || path.starts_with("/admin/")
}

/// True for paths that require any authenticated session.
pub fn is_protected_area(path: &str) -> bool {
    path == "/protected" || path.starts_with("/protected/")
}

/// True for the sign-in/sign-up pages.
pub fn is_auth_page(path: &str) -> bool {
    path == SIGN_IN
        || path.starts_with("/sign-in/")
        || path == SIGN_UP
        || path.starts_with("/sign-up/")
}
