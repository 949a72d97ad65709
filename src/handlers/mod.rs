pub mod admin;
pub mod auth;
pub mod impersonation;
pub mod pages;

use axum::response::Redirect;
use url::form_urlencoded;

/// Redirect carrying a status message in the query string, the way the admin
/// pages surface success and error feedback after a form action.
///
/// Redirect vs. failure are two explicit channels here: handlers match on
/// the service result and pick a destination; errors are never smuggled
/// through a thrown redirect.
pub fn encoded_redirect(kind: &str, path: &str, message: &str) -> Redirect {
    Redirect::to(&encoded_location(kind, path, message))
}

fn encoded_location(kind: &str, path: &str, message: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
    format!("{path}?{kind}={encoded}")
}
