//! The change email alerter.
//!
//! An `Alerter` is built for one account and one report cycle. On
//! construction it collects the addresses of everyone who wants every change
//! email for the account, plus the security team. `report()` then looks at
//! the watcher results, pulls in the issue-only subscribers when any change
//! carries issues, and sends a single summary email.

use crate::config::{Config, TeamEmail};
use crate::core::{ChangeReports, EmailSender, IssueFlags, UserDirectory, Watcher, WatcherAuditor};
use crate::error::AlertError;
use crate::notification::SendReceipt;
use crate::templating::{ReportContext, TemplateRenderer};
use chrono::Utc;
use itertools::Itertools;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Settings the alerter reads from the application configuration.
#[derive(Debug, Clone)]
pub struct AlerterSettings {
    pub security_team_email: TeamEmail,
    pub disable_emails: bool,
    pub change_email_template: String,
}

impl AlerterSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            security_team_email: config.security_team_email.clone(),
            disable_emails: config.disable_emails,
            change_email_template: config.templates.change_email.clone(),
        }
    }
}

impl Default for AlerterSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// The collaborators an alerter needs.
#[derive(Clone)]
pub struct AlerterServices {
    pub directory: Arc<dyn UserDirectory>,
    pub mailer: Arc<dyn EmailSender>,
    pub renderer: Arc<TemplateRenderer>,
    pub settings: AlerterSettings,
}

/// Collects watcher results for one account and emails a summary of them.
pub struct Alerter {
    account: String,
    emails: Vec<String>,
    watchers_auditors: Vec<WatcherAuditor>,
    debug: bool,
    services: AlerterServices,
}

impl Alerter {
    /// Creates an alerter for `account`, seeding the recipients with the
    /// active users subscribed to all change emails and the security team.
    #[instrument(skip(services, watchers_auditors, debug), fields(watchers = watchers_auditors.len()))]
    pub async fn new(
        services: AlerterServices,
        watchers_auditors: Vec<WatcherAuditor>,
        account: &str,
        debug: bool,
    ) -> Result<Self, AlertError> {
        let users = services
            .directory
            .active_subscribers(account, ChangeReports::All)
            .await?;
        let mut emails: Vec<String> = users.into_iter().map(|user| user.email).collect();

        match services.settings.security_team_email.addresses() {
            Some(team) => emails.extend(team),
            None => info!("Alerter: SECURITY_TEAM_EMAIL contains an invalid type"),
        }

        Ok(Self {
            account: account.to_string(),
            emails,
            watchers_auditors,
            debug,
            services,
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// The recipients collected so far. Not deduplicated.
    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    /// Summarizes the changed watchers and sends one email about them.
    ///
    /// Returns `Ok(None)` without sending anything when emails are disabled
    /// or nothing changed.
    #[instrument(skip(self), fields(account = %self.account))]
    pub async fn report(&mut self) -> Result<Option<SendReceipt>, AlertError> {
        if self.services.settings.disable_emails {
            info!("Alerter is not sending emails as they are disabled in the configuration.");
            metrics::counter!("alerter_reports_skipped_total", "reason" => "disabled").increment(1);
            return Ok(None);
        }

        let changed_watchers: Vec<&Watcher> = self
            .watchers_auditors
            .iter()
            .map(|pair| &pair.watcher)
            .filter(|watcher| watcher.is_changed())
            .collect();

        // Only the first watcher with issues pulls in the issue subscribers.
        let mut flags = IssueFlags::default();
        for watcher in &changed_watchers {
            flags = watcher.issues_found();
            if flags.has_issues {
                let users = self
                    .services
                    .directory
                    .active_subscribers(&self.account, ChangeReports::Issues)
                    .await?;
                self.emails.extend(users.into_iter().map(|user| user.email));
                break;
            }
        }

        if changed_watchers.is_empty() {
            info!("Alerter: no changes found");
            metrics::counter!("alerter_reports_skipped_total", "reason" => "unchanged").increment(1);
            return Ok(None);
        }

        let watcher_str = changed_watchers.iter().map(|watcher| &watcher.index).join(", ");
        info!("Alerter: Found some changes in {}: {}", self.account, watcher_str);

        let context = ReportContext {
            account: &self.account,
            generated_at: Utc::now().to_rfc3339(),
            watchers: changed_watchers,
        };
        let body = self
            .services
            .renderer
            .render(&self.services.settings.change_email_template, &context)?;
        let subject = get_subject(flags, &self.account, &watcher_str);

        if self.debug {
            debug!(recipients = ?self.emails, %subject, "Alerter: prepared change email");
            debug!(%body, "Alerter: change email body");
        }

        let receipt = self
            .services
            .mailer
            .send_email(&subject, &self.emails, &body)
            .await?;
        metrics::counter!("alerter_reports_total").increment(1);
        metrics::counter!("alerter_emails_sent_total", "sender" => self.services.mailer.name().to_string())
            .increment(1);
        Ok(Some(receipt))
    }
}

/// Picks the subject line for a change email.
pub fn get_subject(flags: IssueFlags, account: &str, watcher_str: &str) -> String {
    if flags.has_new_issue {
        format!("NEW ISSUE - [{}] Changes in {}", account, watcher_str)
    } else if flags.has_issues && flags.has_unjustified_issue {
        format!("[{}] Changes w/existing issues in {}", account, watcher_str)
    } else if flags.has_issues {
        format!("[{}] Changes w/justified issues in {}", account, watcher_str)
    } else {
        format!("[{}] Changes in {}", account, watcher_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(has_issues: bool, has_new_issue: bool, has_unjustified_issue: bool) -> IssueFlags {
        IssueFlags {
            has_issues,
            has_new_issue,
            has_unjustified_issue,
        }
    }

    #[test]
    fn test_plain_subject() {
        assert_eq!(
            get_subject(flags(false, false, false), "prod", "s3, sqs"),
            "[prod] Changes in s3, sqs"
        );
    }

    #[test]
    fn test_existing_issues_subject() {
        assert_eq!(
            get_subject(flags(true, false, true), "prod", "s3"),
            "[prod] Changes w/existing issues in s3"
        );
    }

    #[test]
    fn test_justified_issues_subject() {
        assert_eq!(
            get_subject(flags(true, false, false), "prod", "s3"),
            "[prod] Changes w/justified issues in s3"
        );
    }

    #[test]
    fn test_new_issue_subject_takes_priority() {
        for (has_issues, unjustified) in [(true, true), (true, false), (false, false), (false, true)] {
            assert_eq!(
                get_subject(flags(has_issues, true, unjustified), "prod", "iamrole"),
                "NEW ISSUE - [prod] Changes in iamrole"
            );
        }
    }

    #[test]
    fn test_unjustified_without_issues_is_plain() {
        assert_eq!(
            get_subject(flags(false, false, true), "prod", "s3"),
            "[prod] Changes in s3"
        );
    }
}
