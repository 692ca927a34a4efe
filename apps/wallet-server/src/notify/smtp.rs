// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SMTP delivery through lettre's async transport (STARTTLS + credentials).

use std::future::Future;

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use super::{Notification, NotifyError};
use crate::config::SmtpConfig;

/// Something that can deliver a [`Notification`].
pub trait Mailer: Send + Sync + 'static {
    fn send(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// SMTP relay mailer.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&config.email)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
            .port(config.port)
            .credentials(Credentials::new(
                config.email.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self { transport, from })
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, NotifyError> {
        build_message(self.from.clone(), notification)
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let message = self.build_message(notification)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

fn parse_mailbox(raw: &str) -> Result<Mailbox, NotifyError> {
    raw.parse().map_err(|_| NotifyError::Address(raw.to_string()))
}

fn build_message(from: Mailbox, notification: &Notification) -> Result<Message, NotifyError> {
    Ok(Message::builder()
        .from(from)
        .to(parse_mailbox(&notification.to)?)
        .subject(notification.subject.clone())
        .header(ContentType::TEXT_HTML)
        .body(notification.body.clone())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(to: &str) -> Notification {
        Notification {
            to: to.to_string(),
            subject: "Subject".to_string(),
            body: "<p>hi</p>".to_string(),
        }
    }

    #[test]
    fn builds_html_message() {
        let from = parse_mailbox("bot@example.com").unwrap();
        let message = build_message(from, &notification("user@example.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: user@example.com"));
        assert!(raw.contains("Subject: Subject"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn invalid_recipient_is_an_address_error() {
        let from = parse_mailbox("bot@example.com").unwrap();
        let err = build_message(from, &notification("not an email")).unwrap_err();
        assert!(matches!(err, NotifyError::Address(_)));
    }

    #[tokio::test]
    async fn mailer_rejects_invalid_sender() {
        let config = SmtpConfig {
            server: "smtp.example.com".into(),
            port: 587,
            email: "nope".into(),
            password: "secret".into(),
        };
        assert!(matches!(SmtpMailer::new(&config), Err(NotifyError::Address(_))));
    }
}
