//! Minimal page shells.
//!
//! The real UI is a separate frontend; these stubs exist so the redirect
//! rules in the middleware stack have concrete targets to land on.

use axum::response::Html;

pub async fn sign_in() -> Html<&'static str> {
    Html("<!doctype html><title>Sign in</title><h1>Sign in</h1>")
}

pub async fn sign_up() -> Html<&'static str> {
    Html("<!doctype html><title>Sign up</title><h1>Sign up</h1>")
}

pub async fn dashboard() -> Html<&'static str> {
    Html("<!doctype html><title>Dashboard</title><h1>Dashboard</h1>")
}

pub async fn protected() -> Html<&'static str> {
    Html("<!doctype html><title>Home</title><h1>Home</h1>")
}

pub async fn welcome() -> Html<&'static str> {
    Html("<!doctype html><title>Welcome</title><h1>Welcome</h1>")
}

pub async fn unauthorized() -> Html<&'static str> {
    Html("<!doctype html><title>Unauthorized</title><h1>Unauthorized</h1>")
}

pub async fn admin_home() -> Html<&'static str> {
    Html("<!doctype html><title>Admin</title><h1>Admin</h1>")
}

pub async fn admin_dashboard() -> Html<&'static str> {
    Html("<!doctype html><title>Admin dashboard</title><h1>Admin dashboard</h1>")
}
