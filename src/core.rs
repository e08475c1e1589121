//! Core domain types and service traits for ChangeWatch
//!
//! This module defines the watcher results the alerter reports on, the user
//! records it addresses, and the trait contracts for the collaborators it
//! talks to (user directory, email sender, auditors).

use crate::directory::DirectoryError;
use crate::notification::{NotifyError, SendReceipt};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A finding attached to a changed item by an auditor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AuditIssue {
    /// Short description of the issue (e.g., "bucket is world readable")
    pub issue: String,
    /// Free-form notes from the auditor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Severity score
    #[serde(default)]
    pub score: u32,
    /// Whether an operator has justified this issue
    #[serde(default)]
    pub justified: bool,
    /// Whether this issue was raised for the first time in this cycle
    #[serde(default)]
    pub new: bool,
}

/// A single resource that a watcher saw created, changed or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChangeItem {
    /// Resource name
    pub name: String,
    /// Region the resource lives in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Issues raised against this item
    #[serde(default)]
    pub audit_issues: Vec<AuditIssue>,
}

impl ChangeItem {
    /// Creates an item with no issues.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Returns `true` if any issue on this item was raised in this cycle.
    pub fn found_new_issue(&self) -> bool {
        self.audit_issues.iter().any(|issue| issue.new)
    }

    /// Issues that were already known before this cycle.
    pub fn confirmed_existing_issues(&self) -> impl Iterator<Item = &AuditIssue> {
        self.audit_issues.iter().filter(|issue| !issue.new)
    }
}

/// Summary of the issues a watcher's changes carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IssueFlags {
    pub has_issues: bool,
    pub has_new_issue: bool,
    pub has_unjustified_issue: bool,
}

/// The change-detection result of one watcher for one account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Watcher {
    /// Type label of the watched resource (e.g., "s3", "iamrole")
    pub index: String,
    #[serde(default)]
    pub created_items: Vec<ChangeItem>,
    #[serde(default)]
    pub changed_items: Vec<ChangeItem>,
    #[serde(default)]
    pub deleted_items: Vec<ChangeItem>,
}

impl Watcher {
    /// Creates a watcher result with no changes.
    pub fn new(index: &str) -> Self {
        Self {
            index: index.to_string(),
            ..Default::default()
        }
    }

    /// Returns `true` if anything was created, changed or deleted.
    pub fn is_changed(&self) -> bool {
        !self.created_items.is_empty()
            || !self.changed_items.is_empty()
            || !self.deleted_items.is_empty()
    }

    /// Inspects created and changed items for audit issues.
    ///
    /// A new issue implies an unjustified one and ends the scan.
    pub fn issues_found(&self) -> IssueFlags {
        let mut flags = IssueFlags::default();
        for item in self.created_items.iter().chain(self.changed_items.iter()) {
            if item.audit_issues.is_empty() {
                continue;
            }
            flags.has_issues = true;
            if item.found_new_issue() {
                flags.has_new_issue = true;
                flags.has_unjustified_issue = true;
                break;
            }
            if item.confirmed_existing_issues().any(|issue| !issue.justified) {
                flags.has_unjustified_issue = true;
            }
        }
        flags
    }
}

/// A watcher result paired with the auditors that evaluate its changes.
#[derive(Clone)]
pub struct WatcherAuditor {
    pub watcher: Watcher,
    pub auditors: Vec<Arc<dyn Auditor>>,
}

impl WatcherAuditor {
    pub fn new(watcher: Watcher, auditors: Vec<Arc<dyn Auditor>>) -> Self {
        Self { watcher, auditors }
    }

    /// Runs every auditor over the created and changed items, appending the
    /// issues they raise.
    pub fn run_audits(&mut self) {
        for auditor in &self.auditors {
            let items = self
                .watcher
                .created_items
                .iter_mut()
                .chain(self.watcher.changed_items.iter_mut());
            for item in items {
                let issues = auditor.audit(item);
                if !issues.is_empty() {
                    tracing::debug!(
                        auditor = auditor.name(),
                        item = %item.name,
                        count = issues.len(),
                        "Auditor raised issues"
                    );
                }
                item.audit_issues.extend(issues);
            }
        }
    }
}

impl std::fmt::Debug for WatcherAuditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherAuditor")
            .field("watcher", &self.watcher)
            .field(
                "auditors",
                &self.auditors.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// How much change email a user wants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeReports {
    /// Every change email
    All,
    /// Only change emails that carry issues
    Issues,
    /// Nothing
    None,
}

/// A platform user as seen by the alerter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub email: String,
    /// Names of the accounts this user belongs to
    pub accounts: Vec<String>,
    pub change_reports: Option<ChangeReports>,
    pub active: bool,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Looks up users interested in an account's change emails.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the active members of `account` whose report preference is
    /// `preference`.
    async fn active_subscribers(
        &self,
        account: &str,
        preference: ChangeReports,
    ) -> Result<Vec<User>, DirectoryError>;
}

/// Delivers a rendered HTML email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// A descriptive name for logging (e.g., "smtp").
    fn name(&self) -> &str;

    async fn send_email(
        &self,
        subject: &str,
        recipients: &[String],
        html: &str,
    ) -> Result<SendReceipt, NotifyError>;
}

/// Evaluates a changed item and raises issues against it.
pub trait Auditor: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the issues to add to `item`. Issues the item already carries
    /// should not be returned again.
    fn audit(&self, item: &ChangeItem) -> Vec<AuditIssue>;
}
