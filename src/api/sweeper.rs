//! Background sweeper for aged reset tickets and expired sessions.
//!
//! Reset tickets are append-only: redemption leaves them in place, so the
//! sweeper is the only thing that removes them. Each tick deletes every
//! activation older than the retention window, regardless of whether it was
//! redeemed, then prunes expired session rows. Failures are logged and the
//! loop simply tries again on the next tick.

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{Instrument, debug, error, info, info_span};

#[derive(Clone, Copy, Debug)]
pub struct SweeperConfig {
    retention: Duration,
    interval: Duration,
}

impl SweeperConfig {
    /// Default sweeper config: one hour retention, swept hourly.
    #[must_use]
    pub fn new() -> Self {
        Self {
            retention: Duration::from_secs(3600),
            interval: Duration::from_secs(3600),
        }
    }

    #[must_use]
    pub fn with_retention_seconds(mut self, seconds: u64) -> Self {
        self.retention = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_interval_seconds(mut self, seconds: u64) -> Self {
        self.interval = Duration::from_secs(seconds);
        self
    }

    /// Clamp zero values so the loop can never spin or delete fresh tickets.
    #[must_use]
    pub fn normalize(self) -> Self {
        let retention = if self.retention.is_zero() {
            Duration::from_secs(1)
        } else {
            self.retention
        };
        let interval = if self.interval.is_zero() {
            Duration::from_secs(1)
        } else {
            self.interval
        };
        Self {
            retention,
            interval,
        }
    }

    #[must_use]
    pub fn retention(&self) -> Duration {
        self.retention
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the background task that deletes aged rows on a fixed cadence.
pub fn spawn_sweeper(pool: PgPool, config: SweeperConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let config = config.normalize();
        let interval = config.interval();

        loop {
            match sweep_expired(&pool, &config).await {
                Ok(removed) if removed > 0 => {
                    info!(removed, "swept aged reset tickets");
                }
                Ok(_) => debug!("sweep found nothing to remove"),
                Err(err) => error!("sweep failed: {err}"),
            }

            if let Err(err) = sweep_sessions(&pool).await {
                error!("session sweep failed: {err}");
            }

            sleep(interval).await;
        }
    })
}

/// Delete every activation older than the retention window. Returns the
/// number of rows removed.
pub async fn sweep_expired(pool: &PgPool, config: &SweeperConfig) -> Result<u64> {
    let retention_seconds =
        i64::try_from(config.retention().as_secs()).context("retention out of range")?;

    let query = r"
        DELETE FROM activations
        WHERE created_at < NOW() - ($1 * INTERVAL '1 second')
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(retention_seconds)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to sweep aged activations")?;

    Ok(result.rows_affected())
}

async fn sweep_sessions(pool: &PgPool) -> Result<u64> {
    let query = "DELETE FROM profile_sessions WHERE expires_at < NOW()";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to sweep expired sessions")?;

    Ok(result.rows_affected())
}
