//! Mail delivery abstraction for the password reset flow.
//!
//! Transport is an external collaborator: handlers build a [`MailMessage`]
//! and hand it to [`dispatch`], which sends on a detached task. The response
//! path never waits on delivery, and delivery failures are logged rather than
//! surfaced to the caller.
//!
//! The default [`LogMailSender`] logs the message instead of sending real
//! email; production deployments implement [`MailSender`] against their
//! relay of choice.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail delivery seam used by the reset handlers.
pub trait MailSender: Send + Sync {
    /// Deliver a message or return an error, which the dispatcher logs.
    fn send(&self, message: &MailMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogMailSender;

impl MailSender for LogMailSender {
    fn send(&self, message: &MailMessage) -> Result<()> {
        info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            "mail send stub"
        );
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    from_address: String,
}

impl MailConfig {
    #[must_use]
    pub fn new(from_address: String) -> Self {
        Self { from_address }
    }

    #[must_use]
    pub fn from_address(&self) -> &str {
        &self.from_address
    }
}

/// Send a message on a detached task; the caller never awaits delivery.
pub fn dispatch(sender: Arc<dyn MailSender>, message: MailMessage) {
    tokio::spawn(async move {
        if let Err(err) = sender.send(&message) {
            error!(to = %message.to, "failed to send mail: {err}");
        }
    });
}

/// Build the password reset message: the new plaintext password plus the
/// activation code the user types back in during redemption.
#[must_use]
pub fn reset_message(
    config: &MailConfig,
    to: &str,
    full_name: Option<&str>,
    password: &str,
    code: &str,
) -> MailMessage {
    let greeting = full_name.unwrap_or(to);
    MailMessage {
        from: config.from_address().to_string(),
        to: to.to_string(),
        subject: "reset password".to_string(),
        body: format!(
            "Hello, {greeting}!\n\nYour new password: {password}\nActivation code: {code}\n"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_sender_accepts_message() {
        let sender = LogMailSender;
        let message = MailMessage {
            from: "Matricula <noreply@matricula.dev>".to_string(),
            to: "user@example.com".to_string(),
            subject: "reset password".to_string(),
            body: "body".to_string(),
        };
        assert!(sender.send(&message).is_ok());
    }

    #[test]
    fn reset_message_prefers_full_name() {
        let config = MailConfig::new("Matricula <noreply@matricula.dev>".to_string());
        let message = reset_message(
            &config,
            "user@example.com",
            Some("Ada Lovelace"),
            "s3cretpw",
            "123456",
        );
        assert_eq!(message.from, "Matricula <noreply@matricula.dev>");
        assert_eq!(message.to, "user@example.com");
        assert!(message.body.contains("Hello, Ada Lovelace!"));
        assert!(message.body.contains("Your new password: s3cretpw"));
        assert!(message.body.contains("Activation code: 123456"));
    }

    #[test]
    fn reset_message_falls_back_to_address() {
        let config = MailConfig::new("Matricula <noreply@matricula.dev>".to_string());
        let message = reset_message(&config, "user@example.com", None, "s3cretpw", "123456");
        assert!(message.body.contains("Hello, user@example.com!"));
    }
}
