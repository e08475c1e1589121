//! An email sender that only logs what it would have sent.
//!
//! Used for dry runs and debugging of the report pipeline.

use crate::core::EmailSender;
use crate::notification::{NotifyError, SendReceipt};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

#[derive(Debug, Default)]
pub struct LoggingMailer;

#[async_trait]
impl EmailSender for LoggingMailer {
    fn name(&self) -> &str {
        "logging"
    }

    #[instrument(skip_all, fields(recipients = recipients.len()))]
    async fn send_email(
        &self,
        subject: &str,
        recipients: &[String],
        html: &str,
    ) -> Result<SendReceipt, NotifyError> {
        info!(%subject, to = %recipients.join(", "), "Dry run: email not sent");
        debug!(body = %html, "Dry run email body");
        Ok(SendReceipt::new(subject, recipients))
    }
}
