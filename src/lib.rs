//! Bakery sales analytics.
//!
//! Loads transaction rows from a DuckDB store (falling back to a CSV backup),
//! derives revenue and profit per row, and reduces them into a [`Summary`].
//! On top of that pipeline sit a dashboard view model, report renderers, a
//! notifier and a daily scheduler.
//!
//! # Quick start
//!
//! ```no_run
//! use bakery_analytics::{Analytics, RowFilter};
//!
//! let analytics = Analytics::builder()
//!     .store_path("bakery_sales.duckdb")
//!     .csv_backup_path("bakery_sales.csv")
//!     .build()
//!     .unwrap();
//!
//! // One-shot pipeline, no caching
//! let rows = analytics.load();
//! let derived = bakery_analytics::derive_metrics(&rows);
//! let summary = bakery_analytics::summarize(&derived);
//!
//! // Cached dataset with a filtered dashboard view
//! let view = analytics.dashboard(&RowFilter::new().cities(&["NYC"]));
//! println!("{}", view.render_text());
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod aggregate;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod format;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod notifier;
pub mod report;
pub mod scheduler;
pub mod store;

pub use aggregate::summarize;
#[cfg(feature = "async")]
pub use async_client::AsyncAnalytics;
pub use cache::RowCache;
pub use config::Settings;
pub use dashboard::DashboardView;
pub use error::{AnalyticsError, Result};
pub use filter::RowFilter;
pub use loader::{BackupFileSource, DataLoader, DataSource, StoreSource};
pub use metrics::derive_metrics;
pub use models::{DerivedRow, Summary, TransactionRow};
pub use report::Report;
pub use store::Store;

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// AnalyticsBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`Analytics`] instance.
///
/// Starts from [`Settings::default()`]; use [`settings()`](Self::settings)
/// to start from environment-derived settings instead.
#[derive(Default)]
pub struct AnalyticsBuilder {
    settings: Settings,
    extra_sources: Vec<Box<dyn DataSource + Send + Sync>>,
}

impl AnalyticsBuilder {
    /// Replace all settings at once.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Path of the DuckDB database file holding the sales table.
    pub fn store_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.settings.store_path = path.as_ref().to_path_buf();
        self
    }

    /// Name of the sales table. Defaults to `sales`.
    pub fn table(mut self, table: &str) -> Self {
        self.settings.table = table.to_string();
        self
    }

    /// Path of the CSV backup consulted when the store yields nothing.
    pub fn csv_backup_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.settings.csv_backup_path = path.as_ref().to_path_buf();
        self
    }

    /// How long [`Analytics::dataset()`] reuses loaded rows.
    ///
    /// Defaults to 5 minutes. A zero TTL reloads on every access.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.settings.cache_ttl = ttl;
        self
    }

    /// Append a source after the store and the CSV backup.
    pub fn fallback_source(mut self, source: Box<dyn DataSource + Send + Sync>) -> Self {
        self.extra_sources.push(source);
        self
    }

    /// Validate the settings and build the instance.
    ///
    /// Does not touch the store or the backup file; they are read on first load.
    pub fn build(self) -> Result<Analytics> {
        config::validate_identifier(&self.settings.table)?;
        let mut loader = DataLoader::from_settings(&self.settings);
        for source in self.extra_sources {
            loader.push(source);
        }
        Ok(Analytics {
            cache: RefCell::new(RowCache::new(self.settings.cache_ttl)),
            settings: self.settings,
            loader,
        })
    }
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

/// Entry point tying the loader, the pipeline and the dataset cache together.
///
/// [`load()`](Self::load) and [`report()`](Self::report) always read fresh
/// data. [`dataset()`](Self::dataset), [`summary()`](Self::summary) and
/// [`dashboard()`](Self::dashboard) go through the [`RowCache`].
pub struct Analytics {
    settings: Settings,
    loader: DataLoader,
    cache: RefCell<RowCache>,
}

impl Analytics {
    pub fn builder() -> AnalyticsBuilder {
        AnalyticsBuilder::default()
    }

    /// Build from environment variables (see [`Settings::from_env`]).
    pub fn from_env() -> Result<Self> {
        Self::builder().settings(Settings::from_env()?).build()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Load raw transactions, falling back through the source chain.
    pub fn load(&self) -> Vec<TransactionRow> {
        self.loader.load()
    }

    /// Derived rows, reused until the cache TTL expires.
    pub fn dataset(&self) -> Arc<Vec<DerivedRow>> {
        self.cache
            .borrow_mut()
            .get_or_load(|| derive_metrics(&self.loader.load()))
    }

    /// Summary of the cached dataset.
    pub fn summary(&self) -> Option<Summary> {
        summarize(&self.dataset())
    }

    /// Dashboard view of the cached dataset under `filter`.
    pub fn dashboard(&self, filter: &RowFilter) -> DashboardView {
        DashboardView::build(&self.dataset(), filter)
    }

    /// Load fresh data and assemble a report dated `date`.
    pub fn report(&self, date: NaiveDate) -> Report {
        let derived = derive_metrics(&self.load());
        let summary = summarize(&derived);
        Report::new(date, derived, summary)
    }

    /// Append `rows` to the sales table of the store, creating the database
    /// file and the table when missing. Returns the number of rows written.
    ///
    /// The cached dataset is invalidated so the next access sees the new rows.
    pub fn seed_store(&self, rows: &[TransactionRow]) -> Result<usize> {
        if let Some(dir) = self.settings.store_path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let store = Store::open(&self.settings.store_path)?;
        store.create_transactions_table(&self.settings.table)?;
        store.insert_transactions(&self.settings.table, rows)?;
        log::info!(
            "Seeded {} rows into {} ({})",
            rows.len(),
            self.settings.table,
            self.settings.store_path.display()
        );
        self.cache.borrow_mut().invalidate();
        Ok(rows.len())
    }

    /// Drop the cached dataset so the next access reloads.
    pub fn refresh(&self) {
        self.cache.borrow_mut().invalidate();
        log::info!("Dataset cache invalidated");
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.loader.source_names()
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Analytics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Analytics(store={}, table={}, backup={}, sources=[{}], cache_ttl={}s)",
            self.settings.store_path.display(),
            self.settings.table,
            self.settings.csv_backup_path.display(),
            self.loader.source_names().join(", "),
            self.settings.cache_ttl.as_secs()
        )
    }
}
