//! Daily report runner.
//!
//! Runs the report job immediately, then every day at `REPORT_TIME`.
//! Pass `--once` to run a single job and exit, and `--seed-from` to load a
//! CSV file into the store first.

use std::path::PathBuf;

use bakery_analytics::config::Settings;
use bakery_analytics::loader::{BackupFileSource, DataSource};
use bakery_analytics::scheduler::{DailySchedule, JobOutcome, ReportJob, Scheduler};
use bakery_analytics::Analytics;
use chrono::Local;
use clap::Parser;

/// Daily bakery sales report generator
#[derive(Parser, Debug)]
#[command(name = "daily-report", about = "Render and deliver the daily bakery sales report")]
struct Args {
    /// Run a single report job and exit instead of scheduling
    #[arg(long)]
    once: bool,

    /// Append the rows of this CSV file (optionally .gz) to the store before running
    #[arg(long, value_name = "CSV")]
    seed_from: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();

    let settings = Settings::from_env()?;
    log::info!("Bakery Analytics System - Daily Report Generator");
    log::info!("   Store:   {}", settings.store_path.display());
    log::info!("   Backup:  {}", settings.csv_backup_path.display());
    log::info!("   Reports: {}", settings.reports_dir.display());

    if let Some(path) = &args.seed_from {
        let rows = BackupFileSource::new(path)
            .try_load()?
            .ok_or_else(|| format!("seed file {} not found", path.display()))?;
        let analytics = Analytics::builder().settings(settings.clone()).build()?;
        analytics.seed_store(&rows)?;
    }

    let job = ReportJob::from_settings(&settings)?;

    if args.once {
        return match job.run_once(Local::now().date_naive()) {
            JobOutcome::Delivered { artifacts } => {
                log::info!("Delivered {} artifacts", artifacts.len());
                Ok(())
            }
            JobOutcome::NoData => Err("no data available for report generation".into()),
            JobOutcome::NotDelivered { reason, .. } => Err(reason.into()),
        };
    }

    let schedule = DailySchedule::new(settings.report_time);
    log::info!(
        "Scheduler started; reports run daily at {}. Press Ctrl+C to stop.",
        settings.report_time.format("%H:%M")
    );
    Scheduler::new(job, schedule).run_forever()
}
