//! Delivery of the rendered change email.
//!
//! The alerter talks to an `EmailSender`; this module provides the SMTP
//! implementation used in production and a logging implementation used for
//! dry runs.
pub mod email;
pub mod logging_mailer;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use email::SmtpMailer;
pub use logging_mailer::LoggingMailer;

/// Errors that can occur during email delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Proof of a delivered email.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendReceipt {
    pub subject: String,
    pub recipients: Vec<String>,
    pub sent_at: DateTime<Utc>,
}

impl SendReceipt {
    pub fn new(subject: &str, recipients: &[String]) -> Self {
        Self {
            subject: subject.to_string(),
            recipients: recipients.to_vec(),
            sent_at: Utc::now(),
        }
    }
}
