//! Transaction loading with an ordered chain of fallback sources.
//!
//! The loader asks each [`DataSource`] in turn and returns the first
//! non-empty result. Failures are logged and swallowed: `load()` always
//! returns, possibly with an empty vector.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::config::Settings;
use crate::error::{AnalyticsError, Result};
use crate::models::TransactionRow;
use crate::store::Store;

// ---------------------------------------------------------------------------
// DataSource
// ---------------------------------------------------------------------------

/// One origin of transaction rows.
pub trait DataSource {
    /// Short label used in log lines.
    fn name(&self) -> &str;

    /// Load every row.
    ///
    /// `Ok(None)` means the source is not available (an expected condition
    /// such as a missing backup file); `Err` means it was available but
    /// could not be read.
    fn try_load(&self) -> Result<Option<Vec<TransactionRow>>>;
}

// ---------------------------------------------------------------------------
// StoreSource
// ---------------------------------------------------------------------------

/// Reads the sales table from a DuckDB database file.
pub struct StoreSource {
    path: PathBuf,
    table: String,
}

impl StoreSource {
    pub fn new<P: AsRef<Path>>(path: P, table: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            table: table.to_string(),
        }
    }
}

impl DataSource for StoreSource {
    fn name(&self) -> &str {
        "database"
    }

    fn try_load(&self) -> Result<Option<Vec<TransactionRow>>> {
        let store = Store::open_read_only(&self.path)?;
        let rows = store.fetch_transactions(&self.table)?;
        Ok(Some(rows))
    }
}

// ---------------------------------------------------------------------------
// BackupFileSource
// ---------------------------------------------------------------------------

/// Reads a CSV backup with a header row. Files ending in `.gz` are
/// decompressed on the fly. Columns beyond the transaction schema are ignored.
pub struct BackupFileSource {
    path: PathBuf,
}

impl BackupFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for BackupFileSource {
    fn name(&self) -> &str {
        "CSV backup"
    }

    fn try_load(&self) -> Result<Option<Vec<TransactionRow>>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("CSV backup file not found: {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let reader: Box<dyn Read> = if self.path.extension().and_then(|e| e.to_str()) == Some("gz") {
            Box::new(GzDecoder::new(BufReader::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        Ok(Some(read_transactions_csv(reader)?))
    }
}

/// Parse transaction rows from CSV with a header row.
///
/// A `NaN` or infinite number makes the whole file an error, the same way a
/// non-finite DOUBLE makes the store fail to deserialize.
pub fn read_transactions_csv<R: Read>(reader: R) -> Result<Vec<TransactionRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for (i, record) in csv_reader.deserialize::<TransactionRow>().enumerate() {
        let row = record?;
        if !row.has_finite_values() {
            return Err(AnalyticsError::InvalidArgument(format!(
                "CSV record {}: non-finite number for {} / {}",
                i + 1,
                row.city,
                row.product
            )));
        }
        rows.push(row);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// DataLoader
// ---------------------------------------------------------------------------

/// Tries each source in order until one yields rows.
pub struct DataLoader {
    sources: Vec<Box<dyn DataSource + Send + Sync>>,
}

impl DataLoader {
    pub fn new(sources: Vec<Box<dyn DataSource + Send + Sync>>) -> Self {
        Self { sources }
    }

    /// The standard chain: the DuckDB store, then the CSV backup.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(vec![
            Box::new(StoreSource::new(&settings.store_path, &settings.table)),
            Box::new(BackupFileSource::new(&settings.csv_backup_path)),
        ])
    }

    /// Append a source to the end of the chain.
    pub fn push(&mut self, source: Box<dyn DataSource + Send + Sync>) {
        self.sources.push(source);
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Load rows from the first source that has any.
    ///
    /// Never fails; returns an empty vector when every source is
    /// unavailable, broken or empty.
    pub fn load(&self) -> Vec<TransactionRow> {
        for (i, source) in self.sources.iter().enumerate() {
            match source.try_load() {
                Ok(Some(rows)) if !rows.is_empty() => {
                    log::info!("Loaded {} rows from {}", rows.len(), source.name());
                    return rows;
                }
                Ok(Some(_)) => log::warn!("{} returned no rows", source.name()),
                Ok(None) => log::warn!("{} is not available", source.name()),
                Err(e) => log::error!("Error loading data from {}: {}", source.name(), e),
            }
            if let Some(next) = self.sources.get(i + 1) {
                log::info!("Trying {}...", next.name());
            }
        }

        log::error!(
            "No data from any source ({})",
            self.source_names().join(", ")
        );
        Vec::new()
    }
}
