//! Counters emitted by the `Alerter` during a report cycle.

mod helpers;

use changewatch::config::TeamEmail;
use changewatch::core::ChangeReports;
use changewatch::directory::test_utils::{active_user, RecordingDirectory};
use changewatch::internal_metrics::LoggingRecorder;
use changewatch::notification::test_utils::RecordingMailer;
use changewatch::{Alerter, AlerterSettings, WatcherAuditor};
use helpers::{changed, services, settings_with_team, unchanged, ACCOUNT};

/// Runs one report on a current-thread runtime so that the thread-local
/// recorder sees every counter.
fn report(recorder: &LoggingRecorder, settings: AlerterSettings, watchers: Vec<WatcherAuditor>) {
    let directory = RecordingDirectory::new(vec![active_user(
        "all@example.com",
        ACCOUNT,
        ChangeReports::All,
    )]);
    let mailer = RecordingMailer::new();

    metrics::with_local_recorder(recorder, || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let mut alerter = Alerter::new(services(&directory, &mailer, settings), watchers, ACCOUNT, false)
                .await
                .unwrap();
            alerter.report().await.unwrap();
        });
    });
}

fn team() -> AlerterSettings {
    settings_with_team(TeamEmail::One("secteam@example.com".to_string()))
}

#[test]
fn test_sent_report_counts_email() {
    let recorder = LoggingRecorder::new();

    report(&recorder, team(), vec![changed("s3")]);

    assert_eq!(recorder.counter_value("alerter_reports_total", &[]), 1);
    assert_eq!(
        recorder.counter_value("alerter_emails_sent_total", &[("sender", "recording")]),
        1
    );
    assert_eq!(
        recorder.counter_value("alerter_reports_skipped_total", &[("reason", "unchanged")]),
        0
    );
}

#[test]
fn test_skipped_reports_count_reason() {
    let recorder = LoggingRecorder::new();
    let disabled = AlerterSettings {
        disable_emails: true,
        ..team()
    };

    report(&recorder, team(), vec![unchanged("s3")]);
    report(&recorder, team(), vec![]);
    report(&recorder, disabled, vec![changed("s3")]);

    assert_eq!(
        recorder.counter_value("alerter_reports_skipped_total", &[("reason", "unchanged")]),
        2
    );
    assert_eq!(
        recorder.counter_value("alerter_reports_skipped_total", &[("reason", "disabled")]),
        1
    );
    assert_eq!(recorder.counter_value("alerter_emails_sent_total", &[("sender", "recording")]), 0);
    assert_eq!(recorder.counter_value("alerter_reports_total", &[]), 0);
}
