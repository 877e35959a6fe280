//! Database helpers for session state and credential lookups.

use anyhow::{Context, Result, anyhow};
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::utils::{generate_session_token, hash_session_token, is_unique_violation};

/// Minimal data returned for a valid session cookie.
pub(crate) struct SessionRecord {
    pub(crate) login: String,
    pub(crate) email: String,
}

/// Stored credential material for a login (used by password login).
pub(super) struct CredentialRecord {
    pub(super) email: String,
    pub(super) password_digest: String,
}

pub(super) async fn lookup_credentials(
    pool: &PgPool,
    login: &str,
) -> Result<Option<CredentialRecord>> {
    let query = "SELECT email, password_digest FROM profiles WHERE login = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(login)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup credentials")?;

    Ok(row.map(|row| CredentialRecord {
        email: row.get("email"),
        password_digest: row.get("password_digest"),
    }))
}

pub(crate) async fn insert_session(pool: &PgPool, login: &str, ttl_seconds: i64) -> Result<String> {
    // Generate a random token, store only its hash, and return the raw value
    // so the caller can set the session cookie.
    let query = r"
        INSERT INTO profile_sessions (session_hash, login, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    for _ in 0..3 {
        let token = generate_session_token()?;
        let token_hash = hash_session_token(&token);
        let result = sqlx::query(query)
            .bind(token_hash)
            .bind(login)
            .bind(ttl_seconds)
            .execute(pool)
            .instrument(span.clone())
            .await;

        match result {
            Ok(_) => return Ok(token),
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert session"),
        }
    }

    Err(anyhow!("failed to generate unique session token"))
}

pub(crate) async fn lookup_session(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<SessionRecord>> {
    // Joining profiles means a deleted account invalidates its sessions
    // without any cascade.
    let query = r"
        SELECT profiles.login, profiles.email
        FROM profile_sessions
        JOIN profiles ON profiles.login = profile_sessions.login
        WHERE profile_sessions.session_hash = $1
          AND profile_sessions.expires_at > NOW()
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    if row.is_none() {
        return Ok(None);
    }

    // Record activity for audit/visibility without extending the session TTL.
    let query = r"
        UPDATE profile_sessions
        SET last_seen_at = NOW()
        WHERE session_hash = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update session last_seen_at")?;

    Ok(row.map(|row| SessionRecord {
        login: row.get("login"),
        email: row.get("email"),
    }))
}

pub(crate) async fn delete_session(pool: &PgPool, token_hash: &[u8]) -> Result<()> {
    // Logout is idempotent; it's fine if no rows are deleted.
    let query = "DELETE FROM profile_sessions WHERE session_hash = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete session")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::SessionRecord;

    #[test]
    fn session_record_holds_values() {
        let record = SessionRecord {
            login: "alice".to_string(),
            email: "alice@example.com".to_string(),
        };
        assert_eq!(record.login, "alice");
        assert_eq!(record.email, "alice@example.com");
    }
}
