//! Password login and logout endpoints.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::{
    session::{SessionResponse, attach_session_cookie, clear_session_cookie, destroy_session},
    state::AuthConfig,
    storage::{insert_session, lookup_credentials},
    utils::password_digest,
};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub login: String,
    pub passwd: String,
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated; session cookie set", body = SessionResponse),
        (status = 400, description = "Missing payload"),
        (status = 401, description = "Unknown login or wrong password"),
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let record = match lookup_credentials(&pool, &request.login).await {
        Ok(record) => record,
        Err(err) => {
            error!("Failed to lookup credentials: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Unknown login and wrong password are indistinguishable to the caller.
    let Some(record) = record else {
        return (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response();
    };
    if record.password_digest != password_digest(&request.passwd) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response();
    }

    match establish_session(&pool, &auth_config, &request.login, &record.email).await {
        Ok((headers, body)) => (StatusCode::OK, headers, Json(body)).into_response(),
        Err(status) => status.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 200, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    destroy_session(&headers, &pool).await;

    // Always clear the cookie, even if the session record was missing.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(&auth_config) {
        response_headers.insert(axum::http::header::SET_COOKIE, cookie);
    }
    (StatusCode::OK, response_headers).into_response()
}

/// Insert a session row for `login` and build the cookie + response body.
///
/// Shared by login and registration, which both end with an established
/// session.
pub(crate) async fn establish_session(
    pool: &PgPool,
    config: &AuthConfig,
    login: &str,
    email: &str,
) -> Result<(HeaderMap, SessionResponse), StatusCode> {
    let token = match insert_session(pool, login, config.session_ttl_seconds()).await {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to create session: {err}");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    // The raw token only leaves the process inside the cookie header.
    let mut headers = HeaderMap::new();
    attach_session_cookie(&mut headers, config, &token);

    Ok((
        headers,
        SessionResponse {
            login: login.to_string(),
            email: email.to_string(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::LoginRequest;

    #[test]
    fn login_request_deserializes() {
        let request: Result<LoginRequest, _> =
            serde_json::from_str(r#"{"login":"alice","passwd":"hunter2"}"#);
        assert!(request.is_ok());
        if let Ok(request) = request {
            assert_eq!(request.login, "alice");
            assert_eq!(request.passwd, "hunter2");
        }
    }

    #[test]
    fn login_request_rejects_missing_fields() {
        let request: Result<LoginRequest, _> = serde_json::from_str(r#"{"login":"alice"}"#);
        assert!(request.is_err());
    }
}
