//! Outbound email dispatch.
//!
//! One message per successful research request: the artifact as a
//! plain-text body. Behind a trait so route tests can record dispatches
//! instead of talking SMTP.

use crate::config::SmtpSecrets;
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

/// Subject line for every result email.
pub const RESULT_SUBJECT: &str = "Your Bible Verse Result";

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// SMTP mailer over lettre's async transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(secrets: &SmtpSecrets) -> Result<Self> {
        let from: Mailbox = secrets
            .from
            .parse()
            .with_context(|| format!("SMTP_FROM is not a valid mailbox: {}", secrets.from))?;
        let credentials =
            Credentials::new(secrets.username.clone(), secrets.password.clone());
        let builder = if secrets.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&secrets.host)
                .context("Failed to configure STARTTLS relay")?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&secrets.host)
        };
        let transport = builder.port(secrets.port).credentials(credentials).build();
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let to: Mailbox = to
            .parse()
            .with_context(|| format!("recipient is not a valid mailbox: {}", to))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("Failed to build email message")?;

        self.transport
            .send(message)
            .await
            .context("Failed to send email")?;
        info!("[M]  Email dispatched");
        Ok(())
    }
}
