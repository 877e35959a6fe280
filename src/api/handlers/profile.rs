//! Profile endpoints for the authenticated account, plus the pre-auth
//! existence check used by the registration UX.
//!
//! Flow Overview:
//! 1) Resolve the session cookie into a principal (except `check`).
//! 2) Perform the read, allow-listed update, or delete for that login.
//!
//! The stored password digest never appears in any response type here.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tracing::{Instrument, error, info_span};
use utoipa::ToSchema;

use super::auth::principal::require_auth;
use super::auth::utils::password_digest;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub login: String,
    pub email: String,
    pub fullname: Option<String>,
    pub courses: Vec<String>,
    pub created_at: String,
}

/// Partial update; absent fields are left untouched. A `login` key in the
/// payload is ignored: logins are immutable.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfileUpdateRequest {
    pub email: Option<String>,
    pub passwd: Option<String>,
    pub fullname: Option<String>,
    pub courses: Option<Vec<String>>,
}

#[utoipa::path(
    get,
    path = "/v1/profile/check/{login}",
    params(
        ("login" = String, Path, description = "Login to probe")
    ),
    responses(
        (status = 200, description = "A profile with this login exists."),
        (status = 404, description = "No such login."),
    ),
    tag = "profile"
)]
pub async fn check(Path(login): Path<String>, pool: Extension<PgPool>) -> impl IntoResponse {
    match profile_exists(&pool, login.trim()).await {
        Ok(true) => StatusCode::OK,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(err) => {
            error!("Failed to check profile existence: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/profile",
    responses(
        (status = 200, description = "The authenticated profile; digest omitted.", body = ProfileResponse),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Session identity no longer resolves."),
    ),
    tag = "profile"
)]
pub async fn get(headers: HeaderMap, pool: Extension<PgPool>) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match fetch_profile(&pool, &principal.login).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to fetch profile: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/v1/profile",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated."),
        (status = 401, description = "Missing or invalid session cookie."),
    ),
    tag = "profile"
)]
pub async fn update(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    payload: Option<Json<ProfileUpdateRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    // Empty strings count as absent, so a sparse form post can't blank out
    // stored fields. The password is digested before it goes anywhere near
    // the store.
    let email = normalize_optional(request.email);
    let digest = normalize_optional(request.passwd).map(|passwd| password_digest(&passwd));
    let fullname = normalize_optional(request.fullname);
    let courses = request.courses;

    if email.is_none() && digest.is_none() && fullname.is_none() && courses.is_none() {
        // Nothing to apply; succeed without touching the store.
        return StatusCode::OK.into_response();
    }

    match update_profile(&pool, &principal.login, email, digest, fullname, courses).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            error!("Failed to update profile: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/v1/profile",
    responses(
        (status = 200, description = "Profile deleted."),
        (status = 401, description = "Missing or invalid session cookie."),
    ),
    tag = "profile"
)]
pub async fn remove(headers: HeaderMap, pool: Extension<PgPool>) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    // Reset tickets for this account are left behind on purpose; the sweeper
    // ages them out.
    match delete_profile(&pool, &principal.login).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            error!("Failed to delete profile: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn profile_exists(pool: &PgPool, login: &str) -> Result<bool, sqlx::Error> {
    let query = "SELECT EXISTS(SELECT 1 FROM profiles WHERE login = $1) AS exists";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(login)
        .fetch_one(pool)
        .instrument(span)
        .await?;
    Ok(row.get("exists"))
}

async fn fetch_profile(pool: &PgPool, login: &str) -> Result<Option<ProfileResponse>, sqlx::Error> {
    let query = r#"
        SELECT
            login,
            email,
            full_name,
            courses,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
        FROM profiles
        WHERE login = $1
        LIMIT 1
    "#;
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(login)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    Ok(row.map(|row| ProfileResponse {
        login: row.get("login"),
        email: row.get("email"),
        fullname: row.get("full_name"),
        courses: row.get("courses"),
        created_at: row.get("created_at"),
    }))
}

async fn update_profile(
    pool: &PgPool,
    login: &str,
    email: Option<String>,
    digest: Option<String>,
    fullname: Option<String>,
    courses: Option<Vec<String>>,
) -> Result<(), sqlx::Error> {
    let query = r"
        UPDATE profiles
        SET
            email = COALESCE($1, email),
            password_digest = COALESCE($2, password_digest),
            full_name = COALESCE($3, full_name),
            courses = COALESCE($4, courses)
        WHERE login = $5
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .bind(digest)
        .bind(fullname)
        .bind(courses)
        .bind(login)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(())
}

async fn delete_profile(pool: &PgPool, login: &str) -> Result<(), sqlx::Error> {
    let query = "DELETE FROM profiles WHERE login = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(login)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}
