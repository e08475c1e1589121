//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use changewatch::config::TeamEmail;
use changewatch::core::{AuditIssue, ChangeItem, Watcher, WatcherAuditor};
use changewatch::directory::test_utils::RecordingDirectory;
use changewatch::notification::test_utils::RecordingMailer;
use changewatch::templating::TemplateRenderer;
use changewatch::{AlerterServices, AlerterSettings};
use std::sync::Arc;

pub const ACCOUNT: &str = "prod";

/// Builds alerter services around the given fakes.
pub fn services(
    directory: &RecordingDirectory,
    mailer: &RecordingMailer,
    settings: AlerterSettings,
) -> AlerterServices {
    AlerterServices {
        directory: Arc::new(directory.clone()),
        mailer: Arc::new(mailer.clone()),
        renderer: Arc::new(TemplateRenderer::builtin().unwrap()),
        settings,
    }
}

/// Settings with the given security team address setting.
pub fn settings_with_team(team: TeamEmail) -> AlerterSettings {
    AlerterSettings {
        security_team_email: team,
        ..AlerterSettings::default()
    }
}

pub fn unchanged(index: &str) -> WatcherAuditor {
    WatcherAuditor::new(Watcher::new(index), vec![])
}

pub fn changed(index: &str) -> WatcherAuditor {
    let mut watcher = Watcher::new(index);
    watcher
        .changed_items
        .push(ChangeItem::new(&format!("{}-item", index)));
    WatcherAuditor::new(watcher, vec![])
}

/// A changed watcher whose single item carries one issue.
pub fn with_issue(index: &str, new: bool, justified: bool) -> WatcherAuditor {
    let mut watcher = Watcher::new(index);
    watcher.changed_items.push(ChangeItem {
        name: format!("{}-item", index),
        region: None,
        audit_issues: vec![AuditIssue {
            issue: "Overly permissive policy".to_string(),
            score: 8,
            new,
            justified,
            ..Default::default()
        }],
    });
    WatcherAuditor::new(watcher, vec![])
}
