use clap::{Arg, ArgAction, Command};

pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    let command = with_mail_args(command);
    with_sweeper_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("session-ttl-seconds")
                .long("session-ttl-seconds")
                .help("Session cookie TTL in seconds")
                .env("MATRICULA_SESSION_TTL_SECONDS")
                .default_value("43200")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("secure-cookies")
                .long("secure-cookies")
                .help("Mark session cookies as Secure (HTTPS-only deployments)")
                .env("MATRICULA_SECURE_COOKIES")
                .action(ArgAction::SetTrue),
        )
}

fn with_mail_args(command: Command) -> Command {
    command.arg(
        Arg::new("mail-from")
            .long("mail-from")
            .help("From address used on password reset mail")
            .env("MATRICULA_MAIL_FROM")
            .default_value("Matricula <noreply@matricula.dev>"),
    )
}

fn with_sweeper_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("reset-retention-seconds")
                .long("reset-retention-seconds")
                .help("Age after which pending reset tickets are deleted")
                .env("MATRICULA_RESET_RETENTION_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("sweep-interval-seconds")
                .long("sweep-interval-seconds")
                .help("Interval between sweeper runs")
                .env("MATRICULA_SWEEP_INTERVAL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Command;

    fn base() -> Command {
        with_args(Command::new("test"))
    }

    #[test]
    fn session_args_have_defaults() {
        let matches = base().get_matches_from(vec!["test"]);
        assert_eq!(
            matches.get_one::<i64>("session-ttl-seconds").copied(),
            Some(43200)
        );
        assert!(!matches.get_flag("secure-cookies"));
    }

    #[test]
    fn sweeper_args_parse_overrides() {
        let matches = base().get_matches_from(vec![
            "test",
            "--reset-retention-seconds",
            "120",
            "--sweep-interval-seconds",
            "30",
        ]);
        assert_eq!(
            matches.get_one::<u64>("reset-retention-seconds").copied(),
            Some(120)
        );
        assert_eq!(
            matches.get_one::<u64>("sweep-interval-seconds").copied(),
            Some(30)
        );
    }

    #[test]
    fn mail_from_default() {
        let matches = base().get_matches_from(vec!["test"]);
        assert_eq!(
            matches.get_one::<String>("mail-from").map(String::as_str),
            Some("Matricula <noreply@matricula.dev>")
        );
    }
}
