//! # Matricula (User Profile & Enrollment Service)
//!
//! `matricula` manages user accounts for a web client: registration, cookie
//! based sessions, profile reads and updates, and password reset via emailed
//! one-time codes.
//!
//! ## Accounts
//!
//! Profiles are keyed by `login`, an immutable alphanumeric identifier that is
//! unique across the service. Email addresses are contact data, not identity:
//! they are not unique, and flows that look a profile up by email resolve to
//! the most recently created match.
//!
//! ## Password reset
//!
//! Reset is a two-phase protocol. Phase one stores an activation ticket (a
//! 6-digit code plus the digest of a freshly generated password) and emails
//! the plaintext password and code to the account's address; the response
//! never waits on mail delivery. Phase two redeems a matching ticket and
//! installs its digest as the profile's password. Tickets are append-only and
//! are removed by a background sweeper once they age past the retention
//! window.
//!
//! ## Sessions
//!
//! Session tokens are random values handed to the browser in an `HttpOnly`
//! cookie; the database stores only their hash. Session lookups join the
//! profile row, so deleting an account invalidates its sessions without any
//! cascade.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
