//! The main application logic, decoupled from the entry point.
//!
//! A run is a single report cycle: load the watcher results, let the
//! auditors annotate them, then hand them to an `Alerter`.

use crate::{
    alerter::{Alerter, AlerterServices, AlerterSettings},
    auditor::PatternAuditor,
    config::Config,
    core::{Auditor, EmailSender, Watcher, WatcherAuditor},
    directory::UserStore,
    notification::{LoggingMailer, SendReceipt, SmtpMailer},
    templating::TemplateRenderer,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, sync::Arc};
use tracing::{info, warn};

/// The contents of a watcher result file.
#[derive(Deserialize)]
#[serde(untagged)]
enum WatcherFile {
    One(Watcher),
    Many(Vec<Watcher>),
}

/// Reads watcher results from JSON files, preserving file order.
pub fn load_watchers<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Watcher>> {
    let mut watchers = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read watcher file: {}", path.display()))?;
        let parsed: WatcherFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse watcher file: {}", path.display()))?;
        match parsed {
            WatcherFile::One(watcher) => watchers.push(watcher),
            WatcherFile::Many(many) => watchers.extend(many),
        }
    }
    info!("Loaded {} watcher results.", watchers.len());
    Ok(watchers)
}

/// Builds the alerter's collaborators from the configuration.
///
/// With `dry_run` set, emails are logged instead of sent over SMTP.
pub fn build_services(config: &Config, dry_run: bool) -> Result<AlerterServices> {
    let directory = match &config.directory.users_file {
        Some(path) => UserStore::from_csv(path)?,
        None => {
            warn!("No users file configured; only the security team will be emailed.");
            UserStore::default()
        }
    };

    let mailer: Arc<dyn EmailSender> = if dry_run {
        Arc::new(LoggingMailer)
    } else {
        Arc::new(SmtpMailer::from_config(&config.mail)?)
    };

    let renderer = TemplateRenderer::from_config(&config.templates)
        .context("Failed to load email templates")?;

    Ok(AlerterServices {
        directory: Arc::new(directory),
        mailer,
        renderer: Arc::new(renderer),
        settings: AlerterSettings::from_config(config),
    })
}

/// Builds the auditors configured for this run.
pub fn build_auditors(config: &Config) -> Result<Vec<Arc<dyn Auditor>>> {
    let mut auditors: Vec<Arc<dyn Auditor>> = Vec::new();
    let pattern = PatternAuditor::new(&config.auditor.rules)?;
    if !pattern.is_empty() {
        auditors.push(Arc::new(pattern));
    }
    Ok(auditors)
}

/// Runs one report cycle for the configured account.
pub async fn run(
    config: &Config,
    watchers: Vec<Watcher>,
    services: AlerterServices,
) -> Result<Option<SendReceipt>> {
    let account = config
        .account
        .as_deref()
        .context("No account configured; pass --account or set `account`")?;

    let auditors = build_auditors(config)?;
    let watchers_auditors: Vec<WatcherAuditor> = watchers
        .into_iter()
        .map(|watcher| {
            let mut pair = WatcherAuditor::new(watcher, auditors.clone());
            pair.run_audits();
            pair
        })
        .collect();

    let mut alerter = Alerter::new(services, watchers_auditors, account, config.debug).await?;
    info!(
        "Starting change report for {} with {} initial recipients.",
        alerter.account(),
        alerter.emails().len()
    );
    let receipt = alerter.report().await?;
    match &receipt {
        Some(receipt) => info!(
            "Change report for {} sent to {} recipients.",
            alerter.account(),
            receipt.recipients.len()
        ),
        None => info!("No change report sent for {}.", alerter.account()),
    }
    Ok(receipt)
}
