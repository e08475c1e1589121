use crate::core::EmailSender;
use crate::notification::{NotifyError, SendReceipt};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// An email recorded by `RecordingMailer`.
#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub subject: String,
    pub recipients: Vec<String>,
    pub html: String,
}

/// An email sender that records every message instead of delivering it.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_email(
        &self,
        subject: &str,
        recipients: &[String],
        html: &str,
    ) -> Result<SendReceipt, NotifyError> {
        if self.fail {
            return Err(NotifyError::Smtp("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            subject: subject.to_string(),
            recipients: recipients.to_vec(),
            html: html.to_string(),
        });
        Ok(SendReceipt::new(subject, recipients))
    }
}
