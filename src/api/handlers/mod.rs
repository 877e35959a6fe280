//! API handlers and shared input validation for Matricula.

pub mod auth;
pub mod health;
pub mod profile;
pub mod register;
pub mod reset;

use regex::Regex;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Lightweight email sanity check used before any store access.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Logins are plain alphanumeric identifiers.
#[must_use]
pub fn valid_login(login: &str) -> bool {
    Regex::new(r"^[a-zA-Z0-9]+$").is_ok_and(|re| re.is_match(login))
}

#[must_use]
pub fn valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}
