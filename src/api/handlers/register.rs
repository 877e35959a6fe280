//! New account registration.
//!
//! Flow Overview:
//! 1) Validate the payload shape before touching the store.
//! 2) Insert the profile; the unique index on `login` decides conflicts.
//! 3) Establish the caller's session, exactly as a successful login would.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{Instrument, error, info_span};
use utoipa::ToSchema;

use super::auth::{
    AuthConfig,
    login::establish_session,
    session::SessionResponse,
    utils::{is_unique_violation, password_digest},
};
use super::{valid_email, valid_login, valid_password};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub login: String,
    pub email: String,
    pub passwd: String,
    pub fullname: Option<String>,
}

/// Outcome when attempting to create a new profile.
#[derive(Debug)]
pub(crate) enum RegisterOutcome {
    Created,
    Conflict,
}

#[utoipa::path(
    post,
    path = "/v1/profile/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Profile created; session cookie set", body = SessionResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 403, description = "Login already taken"),
    ),
    tag = "profile"
)]
pub async fn register(
    pool: Extension<PgPool>,
    auth_config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    // All validation happens before any store access; nothing is written on
    // the failure paths.
    if !valid_login(&request.login) {
        return (StatusCode::BAD_REQUEST, "Invalid login".to_string()).into_response();
    }
    if !valid_email(&request.email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }
    if !valid_password(&request.passwd) {
        return (StatusCode::BAD_REQUEST, "Password too short".to_string()).into_response();
    }

    let digest = password_digest(&request.passwd);
    match insert_profile(&pool, &request, &digest).await {
        Ok(RegisterOutcome::Created) => {}
        Ok(RegisterOutcome::Conflict) => {
            // The existing row is left untouched; only the status leaks that
            // the login exists.
            return (StatusCode::FORBIDDEN, "Login already taken".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to insert profile: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    match establish_session(&pool, &auth_config, &request.login, &request.email).await {
        Ok((headers, body)) => (StatusCode::OK, headers, Json(body)).into_response(),
        Err(status) => status.into_response(),
    }
}

async fn insert_profile(
    pool: &PgPool,
    request: &RegisterRequest,
    digest: &str,
) -> anyhow::Result<RegisterOutcome> {
    let query = r"
        INSERT INTO profiles (login, email, password_digest, full_name, courses)
        VALUES ($1, $2, $3, $4, '{}')
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(&request.login)
        .bind(&request.email)
        .bind(digest)
        .bind(request.fullname.as_deref())
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(RegisterOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(RegisterOutcome::Conflict),
        Err(err) => Err(anyhow::Error::new(err).context("failed to insert profile")),
    }
}

#[cfg(test)]
mod tests {
    use super::{RegisterOutcome, RegisterRequest};

    #[test]
    fn register_request_deserializes_without_fullname() {
        let request: Result<RegisterRequest, _> = serde_json::from_str(
            r#"{"login":"alice","email":"alice@example.com","passwd":"hunter2"}"#,
        );
        assert!(request.is_ok());
        if let Ok(request) = request {
            assert_eq!(request.login, "alice");
            assert_eq!(request.fullname, None);
        }
    }

    #[test]
    fn register_request_rejects_missing_required_fields() {
        let request: Result<RegisterRequest, _> =
            serde_json::from_str(r#"{"login":"alice","email":"alice@example.com"}"#);
        assert!(request.is_err());
    }

    #[test]
    fn register_outcome_debug_names() {
        assert_eq!(format!("{:?}", RegisterOutcome::Created), "Created");
        assert_eq!(format!("{:?}", RegisterOutcome::Conflict), "Conflict");
    }
}
