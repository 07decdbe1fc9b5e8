//! Shared types, helpers, and cookie utilities for the API routes.

// Core framework - re-exported for use by sibling modules
pub use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
pub use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
pub use serde::{Deserialize, Serialize};

// App-level imports
pub use crate::adapters::http::app_state::AppState;
pub use crate::app_error::{AppError, AppResult};
pub use crate::infra::session::{SESSION_COOKIE, SESSION_SIG_COOKIE, SessionPayload};

/// Reads and verifies the session cookie pair. None when either cookie is
/// missing or the pair fails verification (bad signature, malformed,
/// expired, unknown version).
pub(crate) fn session_from_cookies(
    app_state: &AppState,
    cookies: &CookieJar,
) -> Option<SessionPayload> {
    let value = cookies.get(SESSION_COOKIE)?;
    let sig = cookies.get(SESSION_SIG_COOKIE)?;
    app_state.sessions.decode(value.value(), sig.value())
}

/// Session-or-401 for routes that require a logged-in user.
pub(crate) fn require_session(
    app_state: &AppState,
    cookies: &CookieJar,
) -> AppResult<SessionPayload> {
    session_from_cookies(app_state, cookies).ok_or(AppError::Unauthorized)
}

/// Appends a cookie to the headers, handling parse errors gracefully
pub(crate) fn append_cookie(headers: &mut HeaderMap, cookie: Cookie<'_>) -> Result<(), AppError> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|_| AppError::Internal("Failed to build cookie header".into()))?;
    headers.append("set-cookie", value);
    Ok(())
}

/// Sets the signed session cookie pair after a successful OAuth callback.
pub(crate) fn set_session_cookies(
    headers: &mut HeaderMap,
    value: String,
    sig: String,
    ttl: time::Duration,
) -> Result<(), AppError> {
    let session_cookie = Cookie::build((SESSION_COOKIE, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(ttl)
        .build();
    append_cookie(headers, session_cookie)?;

    let sig_cookie = Cookie::build((SESSION_SIG_COOKIE, sig))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(ttl)
        .build();
    append_cookie(headers, sig_cookie)
}

/// Clears the session cookie pair (logout, or any verification failure).
pub(crate) fn clear_session_cookies(headers: &mut HeaderMap) -> Result<(), AppError> {
    for name in [SESSION_COOKIE, SESSION_SIG_COOKIE] {
        let cookie = Cookie::build((name, ""))
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::seconds(0))
            .build();
        append_cookie(headers, cookie)?;
    }
    Ok(())
}
