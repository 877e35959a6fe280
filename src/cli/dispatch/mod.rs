//! Command-line argument dispatch and server initialization.
//!
//! This module takes validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let session_ttl_seconds = matches
        .get_one::<i64>("session-ttl-seconds")
        .copied()
        .unwrap_or(43200);
    let secure_cookies = matches.get_flag("secure-cookies");
    let mail_from = matches
        .get_one::<String>("mail-from")
        .cloned()
        .context("missing required argument: --mail-from")?;
    let reset_retention_seconds = matches
        .get_one::<u64>("reset-retention-seconds")
        .copied()
        .unwrap_or(3600);
    let sweep_interval_seconds = matches
        .get_one::<u64>("sweep-interval-seconds")
        .copied()
        .unwrap_or(3600);

    Ok(Action::Server(Args {
        port,
        dsn,
        session_ttl_seconds,
        secure_cookies,
        mail_from,
        reset_retention_seconds,
        sweep_interval_seconds,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;

    #[test]
    fn dsn_required() {
        temp_env::with_vars(
            [
                ("MATRICULA_DSN", None::<&str>),
                ("MATRICULA_PORT", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let result = command.try_get_matches_from(vec!["matricula"]);
                assert!(result.is_err());
            },
        );
    }

    #[test]
    fn dsn_from_env() {
        temp_env::with_vars(
            [(
                "MATRICULA_DSN",
                Some("postgres://user@localhost:5432/matricula"),
            )],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["matricula"]);
                let action = handler(&matches);
                assert!(action.is_ok());
                if let Ok(Action::Server(args)) = action {
                    assert_eq!(args.dsn, "postgres://user@localhost:5432/matricula");
                    assert_eq!(args.port, 8080);
                    assert_eq!(args.session_ttl_seconds, 43200);
                    assert!(!args.secure_cookies);
                    assert_eq!(args.reset_retention_seconds, 3600);
                    assert_eq!(args.sweep_interval_seconds, 3600);
                }
            },
        );
    }

    #[test]
    fn overrides_flow_into_args() {
        temp_env::with_vars([("MATRICULA_DSN", None::<&str>)], || {
            let command = crate::cli::commands::new();
            let matches = command.get_matches_from(vec![
                "matricula",
                "--dsn",
                "postgres://localhost/matricula",
                "--port",
                "9090",
                "--session-ttl-seconds",
                "600",
                "--secure-cookies",
                "--mail-from",
                "Campus <robot@campus.test>",
                "--reset-retention-seconds",
                "900",
                "--sweep-interval-seconds",
                "60",
            ]);
            let action = handler(&matches);
            assert!(action.is_ok());
            if let Ok(Action::Server(args)) = action {
                assert_eq!(args.port, 9090);
                assert_eq!(args.session_ttl_seconds, 600);
                assert!(args.secure_cookies);
                assert_eq!(args.mail_from, "Campus <robot@campus.test>");
                assert_eq!(args.reset_retention_seconds, 900);
                assert_eq!(args.sweep_interval_seconds, 60);
            }
        });
    }
}
