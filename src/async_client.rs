//! Async wrapper around [`Analytics`] for use in async runtimes (Tokio, etc.).
//!
//! Runs every call on the blocking thread pool via
//! [`tokio::task::spawn_blocking`], since loading blocks on DuckDB and file I/O.
//!
//! # Example
//!
//! ```no_run
//! use bakery_analytics::{AsyncAnalytics, Settings};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let analytics = AsyncAnalytics::new(Settings::default()).await.unwrap();
//!     let summary = analytics.summary().await.unwrap();
//!     println!("{:?}", summary);
//! }
//! ```

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::dashboard::DashboardView;
use crate::error::{AnalyticsError, Result};
use crate::filter::RowFilter;
use crate::models::{DerivedRow, Summary};
use crate::report::Report;
use crate::{Analytics, Settings};

/// Async wrapper around [`Analytics`].
///
/// The inner instance is behind a [`Mutex`] because its dataset cache uses
/// `RefCell`. Overlapping calls are serialized.
#[derive(Clone)]
pub struct AsyncAnalytics {
    inner: Arc<Mutex<Analytics>>,
}

impl AsyncAnalytics {
    /// Build from explicit settings on the blocking pool.
    pub async fn new(settings: Settings) -> Result<Self> {
        tokio::task::spawn_blocking(move || {
            let analytics = Analytics::builder().settings(settings).build()?;
            Ok(AsyncAnalytics {
                inner: Arc::new(Mutex::new(analytics)),
            })
        })
        .await
        .map_err(|e| AnalyticsError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Wrap an already-built instance.
    pub fn from_analytics(analytics: Analytics) -> Self {
        Self {
            inner: Arc::new(Mutex::new(analytics)),
        }
    }

    /// Run a sync operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Analytics) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let analytics = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = analytics
                .lock()
                .map_err(|_| AnalyticsError::InvalidArgument("analytics lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| AnalyticsError::InvalidArgument(format!("Task join error: {e}")))?
    }

    pub async fn dataset(&self) -> Result<Vec<DerivedRow>> {
        self.run(|a| Ok((*a.dataset()).clone())).await
    }

    pub async fn summary(&self) -> Result<Option<Summary>> {
        self.run(|a| Ok(a.summary())).await
    }

    pub async fn dashboard(&self, filter: RowFilter) -> Result<DashboardView> {
        self.run(move |a| Ok(a.dashboard(&filter))).await
    }

    pub async fn report(&self, date: NaiveDate) -> Result<Report> {
        self.run(move |a| Ok(a.report(date))).await
    }

    pub async fn refresh(&self) -> Result<()> {
        self.run(|a| {
            a.refresh();
            Ok(())
        })
        .await
    }
}
