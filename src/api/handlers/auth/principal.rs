//! Authenticated principal extraction.
//!
//! Flow Overview: read the session cookie, resolve it to a profile, and
//! return a principal downstream handlers can use. The identity is the
//! profile's `login`; handlers never read it from the request body.

use axum::http::{HeaderMap, StatusCode};
use sqlx::PgPool;

use super::session::authenticate_session;

/// Authenticated caller context derived from the session cookie.
#[derive(Clone, Debug)]
pub struct Principal {
    pub login: String,
    pub email: String,
}

/// Resolve a session cookie into a principal, or return 401 for missing sessions.
pub async fn require_auth(headers: &HeaderMap, pool: &PgPool) -> Result<Principal, StatusCode> {
    match authenticate_session(headers, pool).await {
        Ok(Some(record)) => Ok(Principal {
            login: record.login,
            email: record.email,
        }),
        Ok(None) => Err(StatusCode::UNAUTHORIZED),
        Err(status) => Err(status),
    }
}
