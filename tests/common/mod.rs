//! Shared test fixtures for the bakery-analytics integration tests.
//!
//! Provides sample transaction rows, a helper that writes them to a CSV
//! backup, and one that loads them into a DuckDB file.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use bakery_analytics::{AnalyticsError, DataSource, Result, Store, TransactionRow};

/// The two-row example: NYC sells 10 bagels at $2, LA sells 5 at $3.
pub fn bagel_rows() -> Vec<TransactionRow> {
    vec![
        TransactionRow::new("NYC", "Bagel", 10.0, 2.0, 1.0),
        TransactionRow::new("LA", "Bagel", 5.0, 3.0, 1.5),
    ]
}

/// A small multi-city, multi-product dataset.
pub fn sample_rows() -> Vec<TransactionRow> {
    vec![
        TransactionRow::new("NYC", "Bagel", 10.0, 2.0, 1.0),
        TransactionRow::new("NYC", "Croissant", 4.0, 3.5, 1.0),
        TransactionRow::new("LA", "Bagel", 5.0, 3.0, 1.5),
        TransactionRow::new("LA", "Muffin", 8.0, 2.5, 2.0),
        TransactionRow::new("Chicago", "Croissant", 6.0, 4.0, 3.5),
        TransactionRow::new("Chicago", "Muffin", 3.0, 2.0, 0.5),
    ]
}

/// Write rows as a CSV backup file with a header row.
pub fn write_csv(dir: &Path, name: &str, rows: &[TransactionRow]) -> PathBuf {
    let path = dir.join(name);
    let mut writer = csv::Writer::from_path(&path).unwrap();
    for row in rows {
        writer.serialize(row).unwrap();
    }
    writer.flush().unwrap();
    path
}

/// Create a DuckDB file at `dir/name` with a `sales` table holding `rows`.
///
/// The store is closed before returning so the loader can reopen it read-only.
pub fn create_store(dir: &Path, name: &str, rows: &[TransactionRow]) -> PathBuf {
    let path = dir.join(name);
    let store = Store::open(&path).unwrap();
    store.create_transactions_table("sales").unwrap();
    store.insert_transactions("sales", rows).unwrap();
    drop(store);
    path
}

/// A source that always fails, standing in for an unreachable database.
pub struct FailingSource;

impl DataSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    fn try_load(&self) -> Result<Option<Vec<TransactionRow>>> {
        Err(AnalyticsError::NotFound("connection refused".to_string()))
    }
}

/// A source that always yields the given rows.
pub struct StaticSource(pub Vec<TransactionRow>);

impl DataSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn try_load(&self) -> Result<Option<Vec<TransactionRow>>> {
        Ok(Some(self.0.clone()))
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
