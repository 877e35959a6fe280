use crate::api::{self, handlers::auth::AuthConfig, mail::MailConfig, sweeper::SweeperConfig};
use anyhow::Result;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub session_ttl_seconds: i64,
    pub secure_cookies: bool,
    pub mail_from: String,
    pub reset_retention_seconds: u64,
    pub sweep_interval_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("server args: {args:?}");

    let auth_config = AuthConfig::new()
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_secure_cookies(args.secure_cookies);

    let mail_config = MailConfig::new(args.mail_from);

    let sweeper_config = SweeperConfig::new()
        .with_retention_seconds(args.reset_retention_seconds)
        .with_interval_seconds(args.sweep_interval_seconds);

    api::new(args.port, args.dsn, auth_config, mail_config, sweeper_config).await
}
