//! End-to-end report cycles through `app`.

mod helpers;

use changewatch::app;
use changewatch::config::{Config, PatternRuleConfig, TeamEmail};
use changewatch::core::ChangeReports;
use changewatch::directory::test_utils::{active_user, RecordingDirectory};
use changewatch::notification::test_utils::RecordingMailer;
use changewatch::AlerterSettings;
use helpers::{services, ACCOUNT};
use std::fs;
use tempfile::TempDir;
use tracing_test::traced_test;

const S3_RESULT: &str = r#"{
    "index": "s3",
    "created_items": [{"name": "public-assets", "region": "us-east-1"}],
    "deleted_items": [{"name": "old-logs"}]
}"#;

const MIXED_RESULTS: &str = r#"[
    {"index": "sqs"},
    {"index": "iamrole", "changed_items": [{"name": "deploy-role"}]}
]"#;

fn write_results(dir: &TempDir) -> Vec<std::path::PathBuf> {
    let first = dir.path().join("s3.json");
    let second = dir.path().join("mixed.json");
    fs::write(&first, S3_RESULT).unwrap();
    fs::write(&second, MIXED_RESULTS).unwrap();
    vec![first, second]
}

fn config() -> Config {
    Config {
        account: Some(ACCOUNT.to_string()),
        security_team_email: TeamEmail::One("secteam@example.com".to_string()),
        ..Config::default()
    }
}

#[test]
fn test_load_watchers_single_and_array_files() {
    let dir = TempDir::new().unwrap();
    let paths = write_results(&dir);

    let watchers = app::load_watchers(&paths).unwrap();

    let indexes: Vec<_> = watchers.iter().map(|w| w.index.as_str()).collect();
    assert_eq!(indexes, vec!["s3", "sqs", "iamrole"]);
    assert!(watchers[0].is_changed());
    assert!(!watchers[1].is_changed());
}

#[test]
fn test_load_watchers_reports_bad_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let err = app::load_watchers(&[path]).unwrap_err();
    assert!(format!("{:#}", err).contains("broken.json"), "got: {err:#}");
}

#[tokio::test]
async fn test_cycle_with_auditor_rules_flags_new_issue() {
    let dir = TempDir::new().unwrap();
    let watchers = app::load_watchers(&write_results(&dir)).unwrap();

    let mut config = config();
    config.auditor.rules.push(PatternRuleConfig {
        pattern: "^public-".to_string(),
        issue: "Publicly named resource".to_string(),
        score: 9,
    });

    let directory = RecordingDirectory::new(vec![
        active_user("all@example.com", ACCOUNT, ChangeReports::All),
        active_user("issues@example.com", ACCOUNT, ChangeReports::Issues),
    ]);
    let mailer = RecordingMailer::new();
    let services = services(&directory, &mailer, AlerterSettings::from_config(&config));

    let receipt = app::run(&config, watchers, services).await.unwrap();

    assert!(receipt.is_some());
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "NEW ISSUE - [prod] Changes in s3, iamrole");
    assert_eq!(
        sent[0].recipients,
        vec!["all@example.com", "secteam@example.com", "issues@example.com"]
    );
    assert!(sent[0].html.contains("Publicly named resource"));
}

#[tokio::test]
async fn test_cycle_without_account_fails() {
    let directory = RecordingDirectory::default();
    let mailer = RecordingMailer::new();
    let config = Config::default();
    let services = services(&directory, &mailer, AlerterSettings::from_config(&config));

    let err = app::run(&config, vec![], services).await.unwrap_err();
    assert!(err.to_string().contains("No account configured"));
}

#[tokio::test]
#[traced_test]
async fn test_dry_run_cycle_with_users_file() {
    let dir = TempDir::new().unwrap();
    let users = dir.path().join("users.csv");
    fs::write(
        &users,
        "email,accounts,change_reports,active\n\
         alice@example.com,prod,ALL,true\n\
         bob@example.com,test,ALL,true\n",
    )
    .unwrap();

    let mut config = config();
    config.directory.users_file = Some(users);

    let watchers = app::load_watchers(&write_results(&dir)).unwrap();
    let services = app::build_services(&config, true).unwrap();

    let receipt = app::run(&config, watchers, services)
        .await
        .unwrap()
        .expect("dry run still produces a receipt");

    assert_eq!(receipt.subject, "[prod] Changes in s3, iamrole");
    assert_eq!(receipt.recipients, vec!["alice@example.com", "secteam@example.com"]);
    assert!(logs_contain("Starting change report for prod with 2 initial recipients."));
    assert!(logs_contain("Change report for prod sent to 2 recipients."));
    assert!(logs_contain("Dry run: email not sent"));
    assert!(logs_contain("Alerter: Found some changes in prod: s3, iamrole"));
}

#[tokio::test]
async fn test_disabled_cycle_sends_nothing() {
    let dir = TempDir::new().unwrap();
    let watchers = app::load_watchers(&write_results(&dir)).unwrap();
    let mut config = config();
    config.disable_emails = true;

    let directory = RecordingDirectory::default();
    let mailer = RecordingMailer::new();
    let services = services(&directory, &mailer, AlerterSettings::from_config(&config));

    let receipt = app::run(&config, watchers, services).await.unwrap();

    assert!(receipt.is_none());
    assert!(mailer.sent().is_empty());
}
