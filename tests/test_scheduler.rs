//! Daily schedule arithmetic and the report job.

mod common;

use std::path::Path;
use std::sync::Mutex;

use bakery_analytics::config::{Settings, SmtpSettings};
use bakery_analytics::notifier::{Notifier, OutboxNotifier, ReportMessage};
use bakery_analytics::report::{DocumentRenderer, Report, ReportRenderer, SpreadsheetRenderer};
use bakery_analytics::scheduler::{DailySchedule, JobOutcome, ReportJob};
use bakery_analytics::{AnalyticsError, BackupFileSource, DataLoader, Result};
use chrono::{NaiveDate, NaiveTime};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

// ---------------------------------------------------------------------------
// DailySchedule
// ---------------------------------------------------------------------------

#[test]
fn next_run_is_later_today_when_time_not_reached() {
    let schedule = DailySchedule::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    let now = date().and_hms_opt(7, 30, 0).unwrap();
    assert_eq!(schedule.next_run_after(now), date().and_hms_opt(9, 0, 0).unwrap());
}

#[test]
fn next_run_is_tomorrow_once_time_has_passed() {
    let schedule = DailySchedule::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    let tomorrow = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();

    let exactly = date().and_hms_opt(9, 0, 0).unwrap();
    assert_eq!(schedule.next_run_after(exactly), tomorrow.and_hms_opt(9, 0, 0).unwrap());

    let evening = date().and_hms_opt(21, 0, 0).unwrap();
    assert_eq!(schedule.next_run_after(evening), tomorrow.and_hms_opt(9, 0, 0).unwrap());
}

// ---------------------------------------------------------------------------
// ReportJob
// ---------------------------------------------------------------------------

/// Records every message instead of delivering it.
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<ReportMessage>>,
}

impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn send(&self, message: &ReportMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

struct RefusingNotifier;

impl Notifier for RefusingNotifier {
    fn name(&self) -> &str {
        "refusing"
    }

    fn send(&self, _message: &ReportMessage) -> Result<()> {
        Err(AnalyticsError::InvalidArgument("relay rejected message".to_string()))
    }
}

struct BrokenRenderer;

impl ReportRenderer for BrokenRenderer {
    fn name(&self) -> &str {
        "broken"
    }

    fn render(&self, _report: &Report, _out_dir: &Path) -> Result<Vec<std::path::PathBuf>> {
        Err(AnalyticsError::NotFound("font missing".to_string()))
    }
}

fn loader_with(rows: &[bakery_analytics::TransactionRow], dir: &Path) -> DataLoader {
    let csv = common::write_csv(dir, "backup.csv", rows);
    DataLoader::new(vec![
        Box::new(common::FailingSource),
        Box::new(BackupFileSource::new(csv)),
    ])
}

#[test]
fn job_renders_and_delivers_to_outbox() {
    let tmp = tempfile::tempdir().unwrap();
    let reports = tmp.path().join("reports");
    let outbox = tmp.path().join("outbox");

    let job = ReportJob::new(
        loader_with(&common::sample_rows(), tmp.path()),
        vec![Box::new(SpreadsheetRenderer::new()), Box::new(DocumentRenderer::new())],
        Box::new(OutboxNotifier::new(&outbox)),
        &reports,
    );

    match job.run_once(date()) {
        JobOutcome::Delivered { artifacts } => {
            assert_eq!(artifacts.len(), 2);
            assert!(artifacts.iter().all(|p| p.starts_with(&reports) && p.exists()));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(outbox
        .join("Daily_Bakery_Sales_Report_-_2024-03-01.json")
        .exists());
}

#[test]
fn job_without_data_renders_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let reports = tmp.path().join("reports");
    let job = ReportJob::new(
        DataLoader::new(vec![Box::new(common::FailingSource)]),
        vec![Box::new(DocumentRenderer::new())],
        Box::new(RefusingNotifier),
        &reports,
    );

    assert_eq!(job.run_once(date()), JobOutcome::NoData);
    assert!(!reports.exists());
}

#[test]
fn failing_renderer_is_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let job = ReportJob::new(
        loader_with(&common::bagel_rows(), tmp.path()),
        vec![Box::new(BrokenRenderer), Box::new(DocumentRenderer::new())],
        Box::new(OutboxNotifier::new(tmp.path().join("outbox"))),
        &tmp.path().join("reports"),
    );

    match job.run_once(date()) {
        JobOutcome::Delivered { artifacts } => assert_eq!(artifacts.len(), 1),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn no_artifacts_means_no_delivery() {
    let tmp = tempfile::tempdir().unwrap();
    let job = ReportJob::new(
        loader_with(&common::bagel_rows(), tmp.path()),
        vec![Box::new(BrokenRenderer)],
        Box::new(RefusingNotifier),
        &tmp.path().join("reports"),
    );

    match job.run_once(date()) {
        JobOutcome::NotDelivered { artifacts, .. } => assert!(artifacts.is_empty()),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn notifier_failure_is_reported_not_raised() {
    let tmp = tempfile::tempdir().unwrap();
    let job = ReportJob::new(
        loader_with(&common::bagel_rows(), tmp.path()),
        vec![Box::new(DocumentRenderer::new())],
        Box::new(RefusingNotifier),
        &tmp.path().join("reports"),
    );

    match job.run_once(date()) {
        JobOutcome::NotDelivered { artifacts, reason } => {
            assert_eq!(artifacts.len(), 1);
            assert!(reason.contains("relay rejected message"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn job_addresses_are_used_in_message() {
    let tmp = tempfile::tempdir().unwrap();
    let notifier = std::sync::Arc::new(RecordingNotifier::default());

    struct Shared(std::sync::Arc<RecordingNotifier>);
    impl Notifier for Shared {
        fn name(&self) -> &str {
            "shared"
        }
        fn send(&self, message: &ReportMessage) -> Result<()> {
            self.0.send(message)
        }
    }

    let job = ReportJob::new(
        loader_with(&common::bagel_rows(), tmp.path()),
        vec![Box::new(DocumentRenderer::new())],
        Box::new(Shared(notifier.clone())),
        &tmp.path().join("reports"),
    )
    .addresses("shop@bakery.local", "boss@bakery.local");

    job.run_once(date());
    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, "shop@bakery.local");
    assert_eq!(sent[0].to, "boss@bakery.local");
    assert_eq!(sent[0].subject, "Daily Bakery Sales Report - 2024-03-01");
}

#[test]
fn standard_job_prefers_email_then_webhook_then_outbox() {
    let tmp = tempfile::tempdir().unwrap();
    let mut settings = Settings {
        reports_dir: tmp.path().join("reports"),
        outbox_dir: tmp.path().join("outbox"),
        ..Settings::default()
    };
    assert_eq!(ReportJob::from_settings(&settings).unwrap().notifier_name(), "outbox");

    settings.webhook_url = Some("http://127.0.0.1:9/hooks/report".to_string());
    assert_eq!(ReportJob::from_settings(&settings).unwrap().notifier_name(), "webhook");

    settings.smtp = Some(SmtpSettings {
        server: "smtp.bakery.example".to_string(),
        port: 587,
        user: "reports@bakery.example".to_string(),
        password: "app-password".to_string(),
        to: "boss@bakery.example".to_string(),
    });
    assert_eq!(ReportJob::from_settings(&settings).unwrap().notifier_name(), "email");
}
