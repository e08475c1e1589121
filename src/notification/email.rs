//! SMTP email sender via `lettre`.
//!
//! Supports STARTTLS, implicit TLS (port 465) and plain connections.

use crate::config::MailConfig;
use crate::core::EmailSender;
use crate::notification::{NotifyError, SendReceipt};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, instrument};

const IMPLICIT_TLS_PORT: u16 = 465;
const SUBMISSION_PORT: u16 = 587;

/// Sends HTML emails through an SMTP server.
#[derive(Debug)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds an `SmtpMailer` from the mail configuration.
    ///
    /// SMTP credentials are read from the `SMTP_USERNAME` and `SMTP_PASSWORD`
    /// environment variables. If either is missing the connection is
    /// unauthenticated.
    pub fn from_config(config: &MailConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        let port = config.smtp_port.unwrap_or(SUBMISSION_PORT);
        let mut builder = if port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host).port(port)
        };

        if let (Ok(username), Ok(password)) =
            (std::env::var("SMTP_USERNAME"), std::env::var("SMTP_PASSWORD"))
        {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Builds the MIME message for a change email.
    fn build_message(
        &self,
        subject: &str,
        recipients: &[String],
        html: &str,
    ) -> Result<Message, NotifyError> {
        if recipients.is_empty() {
            return Err(NotifyError::Config(
                "at least one recipient is required".to_string(),
            ));
        }

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML);

        for recipient in recipients {
            let mailbox: Mailbox = recipient
                .parse()
                .map_err(|e: lettre::address::AddressError| {
                    NotifyError::Config(format!("invalid recipient '{}': {}", recipient, e))
                })?;
            builder = builder.to(mailbox);
        }

        builder
            .body(html.to_string())
            .map_err(|e| NotifyError::Smtp(e.to_string()))
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    fn name(&self) -> &str {
        "smtp"
    }

    #[instrument(skip(self, recipients, html), fields(count = recipients.len()))]
    async fn send_email(
        &self,
        subject: &str,
        recipients: &[String],
        html: &str,
    ) -> Result<SendReceipt, NotifyError> {
        let message = self.build_message(subject, recipients, html)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        info!("Successfully sent change email via SMTP.");
        Ok(SendReceipt::new(subject, recipients))
    }
}
