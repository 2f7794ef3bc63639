//! Daily report job and the loop that runs it.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::aggregate::summarize;
use crate::config::Settings;
use crate::error::Result;
use crate::loader::DataLoader;
use crate::metrics::derive_metrics;
use crate::notifier::{Notifier, OutboxNotifier, ReportMessage, SmtpNotifier, WebhookNotifier};
use crate::report::{DocumentRenderer, Report, ReportRenderer, SpreadsheetRenderer};

/// Longest single sleep while waiting for the next run.
const POLL_INTERVAL: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// DailySchedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// The first scheduled instant strictly after `now`.
    pub fn next_run_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.at);
        if today > now {
            today
        } else {
            let tomorrow = now.date().succ_opt().unwrap_or(NaiveDate::MAX);
            tomorrow.and_time(self.at)
        }
    }
}

// ---------------------------------------------------------------------------
// ReportJob
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Every source was empty; nothing was rendered.
    NoData,
    /// Artifacts were rendered and handed to the notifier.
    Delivered { artifacts: Vec<PathBuf> },
    /// Rendering or delivery failed; `artifacts` lists whatever was written.
    NotDelivered { artifacts: Vec<PathBuf>, reason: String },
}

/// Load, render and deliver one daily report.
pub struct ReportJob {
    loader: DataLoader,
    renderers: Vec<Box<dyn ReportRenderer + Send + Sync>>,
    notifier: Box<dyn Notifier + Send + Sync>,
    reports_dir: PathBuf,
    from: String,
    to: String,
}

impl ReportJob {
    pub fn new(
        loader: DataLoader,
        renderers: Vec<Box<dyn ReportRenderer + Send + Sync>>,
        notifier: Box<dyn Notifier + Send + Sync>,
        reports_dir: &Path,
    ) -> Self {
        Self {
            loader,
            renderers,
            notifier,
            reports_dir: reports_dir.to_path_buf(),
            from: crate::config::DEFAULT_REPORT_FROM.to_string(),
            to: crate::config::DEFAULT_REPORT_TO.to_string(),
        }
    }

    /// Standard job: both renderers, delivered by email when SMTP is
    /// configured, else to the webhook when a URL is set, else to the outbox.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let notifier: Box<dyn Notifier + Send + Sync> = match (&settings.smtp, &settings.webhook_url) {
            (Some(smtp), _) => Box::new(SmtpNotifier::new(smtp.clone(), settings.http_timeout)),
            (None, Some(url)) => Box::new(WebhookNotifier::new(url, settings.http_timeout).connect()?),
            (None, None) => Box::new(OutboxNotifier::new(&settings.outbox_dir)),
        };
        log::info!("Reports will be delivered via {}", notifier.name());
        let (from, to) = match &settings.smtp {
            Some(smtp) => (smtp.user.as_str(), smtp.to.as_str()),
            None => (settings.report_from.as_str(), settings.report_to.as_str()),
        };
        let job = Self::new(
            DataLoader::from_settings(settings),
            vec![
                Box::new(SpreadsheetRenderer::new()),
                Box::new(DocumentRenderer::new()),
            ],
            notifier,
            &settings.reports_dir,
        )
        .addresses(from, to);
        Ok(job)
    }

    /// Name of the transport reports are delivered through.
    pub fn notifier_name(&self) -> &str {
        self.notifier.name()
    }

    pub fn addresses(mut self, from: &str, to: &str) -> Self {
        self.from = from.to_string();
        self.to = to.to_string();
        self
    }

    /// Run the job for `today`. Never panics and never returns an error;
    /// every failure is logged and reflected in the outcome.
    pub fn run_once(&self, today: NaiveDate) -> JobOutcome {
        log::info!("Daily report execution started");

        let rows = self.loader.load();
        if rows.is_empty() {
            log::error!("No data available for report generation");
            return JobOutcome::NoData;
        }
        let derived = derive_metrics(&rows);
        let summary = summarize(&derived);
        if let Some(s) = &summary {
            log::info!(
                "Summary: revenue={:.2} profit={:.2} avg_price={:.2} top_city={} top_product={} lowest_margin_city={} transactions={}",
                s.total_revenue,
                s.total_profit,
                s.avg_unit_price,
                s.top_city,
                s.top_product,
                s.lowest_margin_city_label(),
                s.total_transactions
            );
        }
        let report = Report::new(today, derived, summary);

        let mut artifacts = Vec::new();
        for renderer in &self.renderers {
            match renderer.render(&report, &self.reports_dir) {
                Ok(paths) => artifacts.extend(paths),
                Err(e) => log::error!("Error generating {} report: {}", renderer.name(), e),
            }
        }
        if artifacts.is_empty() {
            return JobOutcome::NotDelivered {
                artifacts,
                reason: "no report artifacts were rendered".to_string(),
            };
        }

        let message = ReportMessage::daily(today, &self.from, &self.to, artifacts.clone());
        match self.notifier.send(&message) {
            Ok(()) => {
                log::info!("Daily report completed successfully");
                JobOutcome::Delivered { artifacts }
            }
            Err(e) => {
                log::error!("Error sending report via {}: {}", self.notifier.name(), e);
                JobOutcome::NotDelivered {
                    artifacts,
                    reason: e.to_string(),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

pub struct Scheduler {
    job: ReportJob,
    schedule: DailySchedule,
}

impl Scheduler {
    pub fn new(job: ReportJob, schedule: DailySchedule) -> Self {
        Self { job, schedule }
    }

    /// Run the job now, then once a day at the scheduled time. Blocks forever.
    pub fn run_forever(&self) -> ! {
        self.job.run_once(Local::now().date_naive());

        loop {
            let next = self.schedule.next_run_after(Local::now().naive_local());
            log::info!("Next report scheduled for {}", next.format("%Y-%m-%d %H:%M"));

            loop {
                let now = Local::now().naive_local();
                if now >= next {
                    break;
                }
                let remaining = (next - now).to_std().unwrap_or(Duration::ZERO);
                thread::sleep(remaining.min(POLL_INTERVAL));
            }

            self.job.run_once(Local::now().date_naive());
        }
    }
}
