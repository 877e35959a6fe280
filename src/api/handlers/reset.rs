//! Two-phase password reset.
//!
//! Phase one (`request`) generates a fresh password and a 6-digit activation
//! code, stores an activation ticket carrying the new password's digest, and
//! mails the plaintext password plus code to the account's address. The
//! response never waits on mail delivery.
//!
//! Phase two (`redeem`) matches a ticket by email and code and installs the
//! ticket's digest as the profile's password. Tickets are not consumed on
//! redemption; the sweeper removes them once they age out (see DESIGN.md).
//!
//! Neither phase requires a session: the emailed code is the proof of
//! ownership.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span};
use utoipa::ToSchema;

use super::auth::utils::{generate_reset_code, generate_reset_password, password_digest};
use super::valid_email;
use crate::api::mail::{self, MailConfig, MailSender};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RedeemRequest {
    pub email: String,
    pub key: String,
}

/// Target account for a reset request. When several profiles share an email,
/// the most recently created one wins (see DESIGN.md).
struct ResetTarget {
    email: String,
    full_name: Option<String>,
}

#[utoipa::path(
    post,
    path = "/v1/profile/reset",
    request_body = ResetRequest,
    responses(
        (status = 200, description = "Ticket stored; mail dispatch is fire-and-forget."),
        (status = 400, description = "Malformed email."),
        (status = 404, description = "No profile with this email."),
    ),
    tag = "reset"
)]
pub async fn request(
    pool: Extension<PgPool>,
    mail_config: Extension<Arc<MailConfig>>,
    mail_sender: Extension<Arc<dyn MailSender>>,
    payload: Option<Json<ResetRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = request.email.trim();
    if !valid_email(email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    let target = match lookup_reset_target(&pool, email).await {
        Ok(Some(target)) => target,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to lookup reset target: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // The plaintext password exists only here and in the outgoing mail; the
    // ticket stores its digest.
    let password = generate_reset_password();
    let code = generate_reset_code();

    if let Err(err) = insert_activation(&pool, &target.email, &code, &password_digest(&password)).await
    {
        error!("Failed to insert activation: {err}");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    info!(email = %target.email, "reset ticket issued");

    let message = mail::reset_message(
        &mail_config,
        &target.email,
        target.full_name.as_deref(),
        &password,
        &code,
    );
    // Fire-and-forget: delivery failures are logged by the dispatcher and
    // never affect this response.
    mail::dispatch(mail_sender.0.clone(), message);

    StatusCode::OK.into_response()
}

#[utoipa::path(
    post,
    path = "/v1/profile/reset/redeem",
    request_body = RedeemRequest,
    responses(
        (status = 200, description = "Password replaced with the ticket's digest."),
        (status = 400, description = "Malformed email or empty key."),
        (status = 404, description = "No ticket matches this email and key."),
    ),
    tag = "reset"
)]
pub async fn redeem(
    pool: Extension<PgPool>,
    payload: Option<Json<RedeemRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = request.email.trim();
    let key = request.key.trim();
    if !valid_email(email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }
    if key.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing key".to_string()).into_response();
    }

    // Exact match on email and code; among matches the newest ticket wins.
    let digest = match find_activation(&pool, email, key).await {
        Ok(Some(digest)) => digest,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to find activation: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match apply_reset(&pool, email, &digest).await {
        Ok(true) => {
            info!(email = %email, "reset ticket redeemed");
            StatusCode::OK.into_response()
        }
        // The ticket outlived its profile.
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to apply reset: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn lookup_reset_target(
    pool: &PgPool,
    email: &str,
) -> Result<Option<ResetTarget>, sqlx::Error> {
    let query = r"
        SELECT email, full_name
        FROM profiles
        WHERE email = $1
        ORDER BY created_at DESC
        LIMIT 1
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    Ok(row.map(|row| ResetTarget {
        email: row.get("email"),
        full_name: row.get("full_name"),
    }))
}

async fn insert_activation(
    pool: &PgPool,
    email: &str,
    code: &str,
    digest: &str,
) -> Result<(), sqlx::Error> {
    // Append-only: outstanding tickets for the same email may pile up until
    // the sweeper ages them out.
    let query = r"
        INSERT INTO activations (email, reset_code, password_digest)
        VALUES ($1, $2, $3)
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .bind(code)
        .bind(digest)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(())
}

async fn find_activation(
    pool: &PgPool,
    email: &str,
    code: &str,
) -> Result<Option<String>, sqlx::Error> {
    let query = r"
        SELECT password_digest
        FROM activations
        WHERE email = $1 AND reset_code = $2
        ORDER BY created_at DESC
        LIMIT 1
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(code)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    Ok(row.map(|row| row.get("password_digest")))
}

/// Install the ticket's digest on the newest profile with this email.
/// Returns false when no profile matches anymore.
async fn apply_reset(pool: &PgPool, email: &str, digest: &str) -> Result<bool, sqlx::Error> {
    let query = r"
        UPDATE profiles
        SET password_digest = $1
        WHERE id = (
            SELECT id FROM profiles
            WHERE email = $2
            ORDER BY created_at DESC
            LIMIT 1
        )
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(digest)
        .bind(email)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::{RedeemRequest, ResetRequest};

    #[test]
    fn reset_request_deserializes() {
        let request: Result<ResetRequest, _> =
            serde_json::from_str(r#"{"email":"user@example.com"}"#);
        assert!(request.is_ok());
    }

    #[test]
    fn redeem_request_requires_both_fields() {
        let request: Result<RedeemRequest, _> =
            serde_json::from_str(r#"{"email":"user@example.com"}"#);
        assert!(request.is_err());

        let request: Result<RedeemRequest, _> =
            serde_json::from_str(r#"{"email":"user@example.com","key":"123456"}"#);
        assert!(request.is_ok());
        if let Ok(request) = request {
            assert_eq!(request.key, "123456");
        }
    }
}
